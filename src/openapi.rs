use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Logistics API",
        version = "0.1.0",
        description = r#"
# Shipping & Logistics Inventory API

Inventory and shipment tracking for warehouse operations.

## Features

- **Directory**: items, warehouses and suppliers as plain CRUD reference data
- **Inventory**: an append-only movement log materialized into per-key stock levels
- **Shipments**: a forward-only status state machine that moves stock on `picked` and `delivered`

## Error Handling

Failing endpoints return a consistent error body:

```json
{
  "error": "Conflict",
  "message": "Invalid status transition: created -> delivered",
  "timestamp": "2025-11-02T10:30:00.000Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        // Items
        crate::handlers::items::create_item,
        crate::handlers::items::get_item,
        crate::handlers::items::list_items,

        // Warehouses
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::list_warehouses,

        // Suppliers
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::list_suppliers,

        // Inventory
        crate::handlers::inventory::record_movement,
        crate::handlers::inventory::get_stock,
        crate::handlers::inventory::list_movements,
        crate::handlers::inventory::reverse_movement,

        // Shipments
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::update_shipment_status,
    ),
    tags(
        (name = "items", description = "Catalog item endpoints"),
        (name = "warehouses", description = "Warehouse endpoints"),
        (name = "suppliers", description = "Supplier endpoints"),
        (name = "inventory", description = "Stock levels and the movement log"),
        (name = "shipments", description = "Shipment lifecycle endpoints")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated OpenAPI document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds_and_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.contains("/inventory/move")));
        assert!(paths.iter().any(|p| p.contains("/shipments")));
        assert!(paths.iter().any(|p| p.contains("/items")));
    }
}
