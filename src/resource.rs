//! Generic REST resource client
//!
//! One client per resource type. The type fixes the URL path segment;
//! everything else (status handling, bearer auth, decoding) is shared.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::model::Created;
use crate::session::Session;
use crate::transport::{ApiRequest, ApiResponse, FilePart, Transport};

/// Default page size for collection queries
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Multipart field the upload endpoint reads the file from
pub const UPLOAD_FIELD: &str = "file";

/// REST collections exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Orders,
    Products,
    Users,
}

impl ResourceType {
    /// URL path segment of the collection
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceType::Orders => "orders",
            ResourceType::Products => "products",
            ResourceType::Users => "users",
        }
    }

    /// Path of the collection, relative to the base URL
    pub fn collection_path(&self) -> String {
        format!("{}/", self.segment())
    }

    /// Path of a single item; the id is percent-encoded
    pub fn item_path(&self, id: &str) -> String {
        let id = urlencoding::encode(id);
        match self {
            // The orders router only matches with the trailing slash
            ResourceType::Orders => format!("orders/{}/", id),
            other => format!("{}/{}", other.segment(), id),
        }
    }

    /// Path that accepts creation requests
    pub fn create_path(&self) -> String {
        match self {
            ResourceType::Products => "products/create".to_string(),
            other => other.collection_path(),
        }
    }

    /// Path that accepts file uploads; only products take images
    pub fn upload_path(&self) -> Option<&'static str> {
        match self {
            ResourceType::Products => Some("products/upload"),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Whose records a collection query returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    User(String),
    Tenant(String),
}

/// A page of a user- or tenant-scoped collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub scope: Scope,
    pub page_index: u32,
    pub page_size: u32,
}

impl ListQuery {
    /// First page of the user's records
    pub fn for_user<S: Into<String>>(user_id: S) -> Self {
        Self {
            scope: Scope::User(user_id.into()),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// First page of the tenant's records
    pub fn for_tenant<S: Into<String>>(tenant_id: S) -> Self {
        Self {
            scope: Scope::Tenant(tenant_id.into()),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Select a page
    pub fn page(mut self, page_index: u32, page_size: u32) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    /// Query-string parameters in the naming the given collection reads
    ///
    /// The products service spells the user and size keys `userid` and
    /// `size`; the other collections use `userId` and `pageSize`.
    pub fn to_params(&self, resource: ResourceType) -> Vec<(String, String)> {
        let (user_key, size_key) = match resource {
            ResourceType::Products => ("userid", "size"),
            _ => ("userId", "pageSize"),
        };
        let (key, id) = match &self.scope {
            Scope::User(id) => (user_key, id),
            Scope::Tenant(id) => ("tenantId", id),
        };
        vec![
            (key.to_string(), id.clone()),
            ("pageIndex".to_string(), self.page_index.to_string()),
            (size_key.to_string(), self.page_size.to_string()),
        ]
    }
}

/// Operations every resource client offers
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// The collection this service talks to
    fn resource_type(&self) -> ResourceType;

    /// Fetch one page of the collection; only status 200 is a success
    async fn list(&self, query: &ListQuery) -> Result<Value, ClientError>;

    /// Fetch one item by id; only status 200 is a success
    async fn get(&self, id: &str) -> Result<Value, ClientError>;

    /// Create an item; any 2xx status is a success
    async fn create(&self, body: Value) -> Result<Value, ClientError>;
}

/// HTTP client for one resource type
pub struct ResourceClient<T: Transport> {
    resource: ResourceType,
    config: Arc<ClientConfig>,
    transport: Arc<T>,
    session: Session,
}

impl<T: Transport> ResourceClient<T> {
    /// Create a client for the given resource type
    pub fn new(
        resource: ResourceType,
        config: Arc<ClientConfig>,
        transport: Arc<T>,
        session: Session,
    ) -> Self {
        Self {
            resource,
            config,
            transport,
            session,
        }
    }

    /// Same as [`ResourceService::list`], decoded into `R`
    pub async fn list_as<R: DeserializeOwned>(&self, query: &ListQuery) -> Result<R, ClientError> {
        let body = self.list(query).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Same as [`ResourceService::get`], decoded into `R`
    pub async fn get_as<R: DeserializeOwned>(&self, id: &str) -> Result<R, ClientError> {
        let body = self.get(id).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Serialize `body`, create the item, decode the answer into `R`
    pub async fn create_as<B, R>(&self, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let created = self.create(body).await?;
        Ok(serde_json::from_value(created)?)
    }

    /// Upload one file as the multipart `file` part; returns the stored file's id
    ///
    /// The id goes into [`Product::thumbnails`](crate::model::Product).
    #[tracing::instrument(skip(self, bytes), fields(resource = %self.resource, len = bytes.len()))]
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Created, ClientError> {
        let path = self.resource.upload_path().ok_or_else(|| {
            ClientError::Unsupported(format!("{} does not accept uploads", self.resource))
        })?;
        let url = self.config.endpoint(path)?;
        let request = ApiRequest::upload(url, FilePart::new(UPLOAD_FIELD, file_name, bytes));
        let body = self
            .send_expecting(request, ApiResponse::is_success)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    fn authorize(&self, request: ApiRequest) -> ApiRequest {
        request.with_bearer(Some(self.session.token()))
    }

    async fn send_expecting(
        &self,
        request: ApiRequest,
        accept: fn(&ApiResponse) -> bool,
    ) -> Result<Value, ClientError> {
        let method = request.method;
        let url = request.url.clone();

        let response = self.transport.send(self.authorize(request)).await.map_err(|e| {
            tracing::warn!(resource = %self.resource, %method, %url, "Request failed: {}", e);
            e
        })?;

        if accept(&response) {
            Ok(response.body)
        } else {
            tracing::warn!(
                resource = %self.resource,
                %method,
                %url,
                status = response.status,
                "Backend rejected request"
            );
            Err(ClientError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            })
        }
    }
}

impl<T: Transport> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource,
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            session: self.session.clone(),
        }
    }
}

#[async_trait]
impl<T: Transport> ResourceService for ResourceClient<T> {
    fn resource_type(&self) -> ResourceType {
        self.resource
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn list(&self, query: &ListQuery) -> Result<Value, ClientError> {
        let url = self.config.endpoint(&self.resource.collection_path())?;
        let request = ApiRequest::get(url).with_query(query.to_params(self.resource));
        self.send_expecting(request, ApiResponse::is_ok).await
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn get(&self, id: &str) -> Result<Value, ClientError> {
        let url = self.config.endpoint(&self.resource.item_path(id))?;
        self.send_expecting(ApiRequest::get(url), ApiResponse::is_ok)
            .await
    }

    #[tracing::instrument(skip(self, body), fields(resource = %self.resource))]
    async fn create(&self, body: Value) -> Result<Value, ClientError> {
        let url = self.config.endpoint(&self.resource.create_path())?;
        self.send_expecting(ApiRequest::post(url, body), ApiResponse::is_success)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateProductRequest, OrdersPage, Product};
    use crate::transport::stub::StubTransport;
    use crate::transport::Method;
    use serde_json::json;

    fn client(resource: ResourceType, transport: StubTransport) -> (ResourceClient<StubTransport>, Arc<StubTransport>) {
        let transport = Arc::new(transport);
        let client = ResourceClient::new(
            resource,
            Arc::new(ClientConfig::default()),
            Arc::clone(&transport),
            Session::in_memory(),
        );
        (client, transport)
    }

    #[test]
    fn test_paths() {
        assert_eq!(ResourceType::Orders.collection_path(), "orders/");
        assert_eq!(ResourceType::Orders.item_path("o1"), "orders/o1/");
        assert_eq!(ResourceType::Products.item_path("a b/c"), "products/a%20b%2Fc");
        assert_eq!(ResourceType::Products.create_path(), "products/create");
        assert_eq!(ResourceType::Users.create_path(), "users/");
        assert_eq!(ResourceType::Products.upload_path(), Some("products/upload"));
        assert_eq!(ResourceType::Orders.upload_path(), None);
    }

    #[test]
    fn test_query_params() {
        let params = ListQuery::for_tenant("t1").page(2, 25).to_params(ResourceType::Orders);
        assert_eq!(
            params,
            vec![
                ("tenantId".to_string(), "t1".to_string()),
                ("pageIndex".to_string(), "2".to_string()),
                ("pageSize".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_product_query_params() {
        let params = ListQuery::for_user("u1").page(0, 20).to_params(ResourceType::Products);
        assert_eq!(
            params,
            vec![
                ("userid".to_string(), "u1".to_string()),
                ("pageIndex".to_string(), "0".to_string()),
                ("size".to_string(), "20".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_product_image() {
        let (products, transport) = client(
            ResourceType::Products,
            StubTransport::new().respond(200, json!({ "id": "5a0c1f" })),
        );
        products.session.set_token("T1");

        let created = products.upload("tea.png", b"\x89PNG".to_vec()).await.unwrap();
        assert_eq!(created.id, "5a0c1f");

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url.as_str(), "http://localhost:8000/api/v1/products/upload");
        assert!(sent.body.is_none());
        assert_eq!(sent.bearer.as_deref(), Some("T1"));
        let file = sent.file.unwrap();
        assert_eq!(file.field, "file");
        assert_eq!(file.file_name, "tea.png");
        assert_eq!(file.bytes, b"\x89PNG".to_vec());
    }

    #[tokio::test]
    async fn test_upload_rejected_and_unsupported() {
        let (products, _) = client(
            ResourceType::Products,
            StubTransport::new().respond(500, json!({ "error": "file part error." })),
        );
        let err = products.upload("tea.png", vec![1, 2, 3]).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.api_message(), Some("file part error."));

        let (orders, transport) = client(ResourceType::Orders, StubTransport::new());
        let err = orders.upload("tea.png", vec![1]).await.unwrap_err();
        assert!(matches!(err, ClientError::Unsupported(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_uses_query_params() {
        let body = json!({ "orders": { "Count": 0, "Data": [] } });
        let (orders, transport) = client(ResourceType::Orders, StubTransport::new().respond(200, body.clone()));

        let result = orders.list(&ListQuery::for_user("u42").page(1, 5)).await.unwrap();
        assert_eq!(result, body);

        let request = transport.last_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url.as_str(), "http://localhost:8000/api/v1/orders/");
        assert!(request.query.contains(&("userId".to_string(), "u42".to_string())));
        assert!(request.query.contains(&("pageIndex".to_string(), "1".to_string())));
        assert!(request.query.contains(&("pageSize".to_string(), "5".to_string())));
        assert!(request.bearer.is_none());
    }

    #[tokio::test]
    async fn test_list_success_only_on_exactly_200() {
        for status in [201u16, 204, 404, 500] {
            let (orders, _) = client(
                ResourceType::Orders,
                StubTransport::new().respond(status, json!({ "error": "nope" })),
            );
            let err = orders.list(&ListQuery::for_user("u1")).await.unwrap_err();
            assert_eq!(err.status(), Some(status));
        }
    }

    #[tokio::test]
    async fn test_list_500_reports_status() {
        let (orders, _) = client(
            ResourceType::Orders,
            StubTransport::new().respond(500, json!({ "error": "database down" })),
        );
        let err = orders.list(&ListQuery::for_user("u1")).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 500, .. }));
        assert_eq!(err.api_message(), Some("database down"));
    }

    #[tokio::test]
    async fn test_list_transport_failure() {
        let (orders, _) = client(ResourceType::Orders, StubTransport::new().fail("connection refused"));
        let err = orders.list(&ListQuery::for_user("u1")).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_list_as_orders_page() {
        let body = json!({
            "userId": "u1",
            "tenanId": "",
            "orders": { "Count": 1, "PageIndex": 0, "PageSize": 10, "Data": [{ "inoiceID": 7 }] }
        });
        let (orders, _) = client(ResourceType::Orders, StubTransport::new().respond(200, body));

        let page: OrdersPage = orders.list_as(&ListQuery::for_user("u1")).await.unwrap();
        assert_eq!(page.orders.data.len(), 1);
        assert_eq!(page.orders.data[0].invoice_id, 7);
    }

    #[tokio::test]
    async fn test_bearer_sent_when_logged_in() {
        let (products, transport) = client(ResourceType::Products, StubTransport::new().respond(200, json!({})));
        products.session.set_token("T1");

        products.get("p1").await.unwrap();
        let request = transport.last_request();
        assert_eq!(request.bearer.as_deref(), Some("T1"));
        assert_eq!(request.url.as_str(), "http://localhost:8000/api/v1/products/p1");
    }

    #[tokio::test]
    async fn test_create_product() {
        let (products, transport) = client(
            ResourceType::Products,
            StubTransport::new().respond(201, json!({ "id": "p9" })),
        );
        let request = CreateProductRequest {
            product: Product {
                name: "Tea".to_string(),
                price: "3.50".to_string(),
                ..Default::default()
            },
        };

        let created: Created = products.create_as(&request).await.unwrap();
        assert_eq!(created.id, "p9");

        let sent = transport.last_request();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url.as_str(), "http://localhost:8000/api/v1/products/create");
        assert_eq!(sent.body.unwrap()["product"]["name"], json!("Tea"));
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let (orders, _) = client(
            ResourceType::Orders,
            StubTransport::new().respond(400, json!({ "error": "order not found" })),
        );
        let err = orders.create(json!({ "invoice": {} })).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
