//! Catalog operations exposed over HTTP
//!
//! The method alone selects the operation; the request path is not inspected.

use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use serde_json::{json, Value};

use super::error::ApiError;
use crate::catalog::{Catalog, CatalogBackend};
use crate::http::{self, HttpResponse, QueryParams};

/// The parts of a request the dispatcher needs, already read off the wire
#[derive(Debug, Clone)]
pub struct CatalogRequest {
    pub method: Method,
    pub query: Option<String>,
    pub body: Bytes,
}

/// Route a request to the matching catalog operation
pub async fn dispatch<B: CatalogBackend>(
    catalog: &Catalog<B>,
    request: &CatalogRequest,
) -> Result<HttpResponse, ApiError> {
    match request.method {
        Method::OPTIONS => Ok(http::build_options_response()),
        Method::GET => list_products(catalog).await,
        Method::POST => add_product(catalog, &request.body).await,
        Method::DELETE => delete_product(catalog, request.query.as_deref()).await,
        ref other => Err(ApiError::MethodNotAllowed(other.to_string())),
    }
}

async fn list_products<B: CatalogBackend>(catalog: &Catalog<B>) -> Result<HttpResponse, ApiError> {
    let products = catalog.list().await?;
    Ok(http::build_json_response(StatusCode::OK, &products))
}

async fn add_product<B: CatalogBackend>(
    catalog: &Catalog<B>,
    body: &[u8],
) -> Result<HttpResponse, ApiError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedRequest(e.to_string()))?;

    let (Some(name), Some(price)) = (name_field(&payload), price_field(&payload)) else {
        return Err(ApiError::Validation("Name and price are required"));
    };

    catalog.add(name, &price).await?;
    Ok(http::build_json_response(
        StatusCode::CREATED,
        &json!({ "message": "Product added successfully" }),
    ))
}

async fn delete_product<B: CatalogBackend>(
    catalog: &Catalog<B>,
    query: Option<&str>,
) -> Result<HttpResponse, ApiError> {
    let params = QueryParams::parse(query);
    let (Some(name), Some(price)) = (
        params.get("name").filter(|n| !n.trim().is_empty()),
        params.get("price").filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Name and price are required to delete",
        ));
    };

    catalog.delete(name, price).await?;
    Ok(http::build_json_response(
        StatusCode::OK,
        &json!({ "message": "Product deleted successfully" }),
    ))
}

/// Non-blank string `name`
fn name_field(payload: &Value) -> Option<&str> {
    payload
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
}

/// `price` as text: JSON numbers verbatim, strings unless empty.
/// Whether the text is numeric is decided by the catalog.
fn price_field(payload: &Value) -> Option<String> {
    match payload.get("price")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryBackend;
    use http_body_util::BodyExt;

    fn catalog_with(contents: &str) -> Catalog<MemoryBackend> {
        Catalog::new(MemoryBackend::with_contents(contents))
    }

    fn request(method: Method, query: Option<&str>, body: &str) -> CatalogRequest {
        CatalogRequest {
            method,
            query: query.map(ToString::to_string),
            body: Bytes::from(body.to_string()),
        }
    }

    /// Dispatch and flatten errors the way the router does
    async fn call(catalog: &Catalog<MemoryBackend>, req: CatalogRequest) -> (u16, Value) {
        let response = dispatch(catalog, &req)
            .await
            .unwrap_or_else(ApiError::into_response);
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_example_session() {
        let catalog = catalog_with("laptop, 999.99\n");

        let (status, body) = call(
            &catalog,
            request(Method::POST, None, r#"{"name":"Mouse","price":20}"#),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(body, json!({ "message": "Product added successfully" }));

        let (status, body) = call(&catalog, request(Method::GET, None, "")).await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!([{ "name": "laptop", "price": 999.99 }, { "name": "Mouse", "price": 20 }])
        );

        let (status, body) = call(
            &catalog,
            request(Method::POST, None, r#"{"name":"laptop","price":999.99}"#),
        )
        .await;
        assert_eq!(status, 409);
        assert_eq!(body, json!({ "error": "Duplicate product (same name and price)" }));

        let delete = || request(Method::DELETE, Some("name=Mouse&price=20"), "");
        let (status, _) = call(&catalog, delete()).await;
        assert_eq!(status, 200);

        let (_, body) = call(&catalog, request(Method::GET, None, "")).await;
        assert_eq!(body, json!([{ "name": "laptop", "price": 999.99 }]));

        let (status, body) = call(&catalog, delete()).await;
        assert_eq!(status, 404);
        assert_eq!(body, json!({ "error": "Product not found" }));
    }

    #[tokio::test]
    async fn test_options_is_no_content() {
        let catalog = catalog_with("");
        let (status, body) = call(&catalog, request(Method::OPTIONS, None, "")).await;
        assert_eq!(status, 204);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let catalog = catalog_with("");
        for method in [Method::PUT, Method::PATCH, Method::HEAD] {
            let (status, _) = call(&catalog, request(method, None, "")).await;
            assert_eq!(status, 405);
        }
    }

    #[tokio::test]
    async fn test_get_storage_failure_is_500() {
        let catalog = Catalog::new(MemoryBackend::missing());
        let (status, body) = call(&catalog, request(Method::GET, None, "")).await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_post_validation() {
        let catalog = catalog_with("");
        let bodies = [
            r#"{"price":10}"#,
            r#"{"name":"","price":10}"#,
            r#"{"name":"Pen"}"#,
            r#"{"name":"Pen","price":null}"#,
            r#"{"name":"Pen","price":""}"#,
            r#"{"name":"Pen","price":"ten"}"#,
            r#"{"name":"Cable, USB-C","price":5}"#,
            r#"{"name":"Pen\nlaptop, 1","price":5}"#,
            r#"["Pen",10]"#,
        ];
        for body in bodies {
            let (status, _) = call(&catalog, request(Method::POST, None, body)).await;
            assert_eq!(status, 400, "{body}");
        }
        assert_eq!(catalog.backend().contents().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_post_malformed_json() {
        let catalog = catalog_with("");
        let (status, body) = call(&catalog, request(Method::POST, None, "{name: ")).await;
        assert_eq!(status, 400);
        assert_eq!(body, json!({ "error": "Invalid JSON" }));
    }

    #[tokio::test]
    async fn test_post_accepts_numeric_string_price() {
        let catalog = catalog_with("");
        let (status, _) = call(
            &catalog,
            request(Method::POST, None, r#"{"name":"Desk","price":"150.5"}"#),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(
            catalog.backend().contents().as_deref(),
            Some("Desk, 150.5\n")
        );
    }

    #[tokio::test]
    async fn test_post_storage_failure_is_500() {
        let catalog = Catalog::new(MemoryBackend::missing());
        let (status, _) = call(
            &catalog,
            request(Method::POST, None, r#"{"name":"Desk","price":1}"#),
        )
        .await;
        assert_eq!(status, 500);
    }

    #[tokio::test]
    async fn test_delete_validation() {
        let catalog = catalog_with("a, 1\n");
        for query in [None, Some("name=a"), Some("price=1"), Some("name=&price=1"), Some("name=a&price=abc")] {
            let (status, _) = call(&catalog, request(Method::DELETE, query, "")).await;
            assert_eq!(status, 400, "{query:?}");
        }
        assert_eq!(catalog.backend().contents().as_deref(), Some("a, 1\n"));
    }

    #[tokio::test]
    async fn test_delete_decodes_query() {
        let catalog = catalog_with("Gaming Mouse, 49.9\n");
        let (status, _) = call(
            &catalog,
            request(Method::DELETE, Some("name=gaming%20mouse&price=49.90"), ""),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(catalog.backend().contents().as_deref(), Some(""));
    }
}
