//! Wire models exchanged with the console backend
//!
//! Field names follow the backend's JSON exactly, including its spelling
//! (`inoiceID`, `tenanId`, capitalized pagination keys).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Role of a backend user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum UserAuthority {
    #[default]
    Unknown,
    Customer,
    Tenant,
    Admin,
}

impl From<i32> for UserAuthority {
    fn from(value: i32) -> Self {
        match value {
            1 => UserAuthority::Customer,
            2 => UserAuthority::Tenant,
            3 => UserAuthority::Admin,
            _ => UserAuthority::Unknown,
        }
    }
}

impl From<UserAuthority> for i32 {
    fn from(value: UserAuthority) -> Self {
        match value {
            UserAuthority::Unknown => 0,
            UserAuthority::Customer => 1,
            UserAuthority::Tenant => 2,
            UserAuthority::Admin => 3,
        }
    }
}

/// A backend user as returned by login and `users/<id>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub authority: UserAuthority,
}

/// Login response body
///
/// The backend omits `user` and `token` on failure and may set `err` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl LoginResponse {
    /// The user record decoded into [`User`]
    pub fn user(&self) -> Option<User> {
        self.user
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Registration request body for `POST users/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Response of every create endpoint and of an image upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Created {
    #[serde(default)]
    pub id: String,
}

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum OrderStatus {
    #[default]
    Unknown,
    Created,
    Paid,
    Dispatched,
    Finished,
    Canceled,
}

impl From<i32> for OrderStatus {
    fn from(value: i32) -> Self {
        match value {
            1 => OrderStatus::Created,
            2 => OrderStatus::Paid,
            3 => OrderStatus::Dispatched,
            4 => OrderStatus::Finished,
            5 => OrderStatus::Canceled,
            _ => OrderStatus::Unknown,
        }
    }
}

impl From<OrderStatus> for i32 {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Unknown => 0,
            OrderStatus::Created => 1,
            OrderStatus::Paid => 2,
            OrderStatus::Dispatched => 3,
            OrderStatus::Finished => 4,
            OrderStatus::Canceled => 5,
        }
    }
}

/// One line of an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub quantity: i32,
    #[serde(rename = "code")]
    pub product_id: String,
    pub price: f32,
    pub total: f32,
    #[serde(rename = "cartID")]
    pub cart_id: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
}

/// An order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invoice {
    #[serde(rename = "inoiceID")]
    pub invoice_id: i64,
    pub amount: f32,
    pub discount: f32,
    #[serde(rename = "discountid")]
    pub discount_id: f32,
    #[serde(rename = "userid")]
    pub user_id: String,
    #[serde(rename = "addressId")]
    pub address_id: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    pub items: Vec<OrderItem>,
}

/// Body of `POST orders/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub invoice: Invoice,
}

/// A product listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "tenantID")]
    pub tenant_id: String,
    #[serde(rename = "catalogID")]
    pub catalog_id: String,
    pub status: i32,
    pub thumbnails: Vec<String>,
}

/// Body of `POST products/create`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub product: Product,
}

/// One page of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Pagination<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sortor: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<T>,
}

impl<T> Default for Pagination<T> {
    fn default() -> Self {
        Self {
            count: 0,
            page_index: 0,
            page_size: 0,
            sortor: Vec::new(),
            data: Vec::new(),
        }
    }
}

/// Response of `GET orders/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersPage {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "tenanId", default)]
    pub tenant_id: String,
    #[serde(default)]
    pub orders: Pagination<Invoice>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_orders_page_from_backend_json() {
        let body = json!({
            "userId": "59f05169668b9bcc7d442355",
            "tenanId": "",
            "orders": {
                "Count": 1,
                "PageIndex": 0,
                "PageSize": 10,
                "Sortor": null,
                "Data": [{
                    "inoiceID": 42,
                    "amount": 19.5,
                    "userid": "59f05169668b9bcc7d442355",
                    "status": 2,
                    "tenantID": "t1",
                    "items": [{ "quantity": 3, "code": "p1", "price": 6.5, "total": 19.5 }]
                }]
            }
        });

        let page: OrdersPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.orders.count, 1);
        assert!(page.orders.sortor.is_empty());
        let order = &page.orders.data[0];
        assert_eq!(order.invoice_id, 42);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.items[0].product_id, "p1");
        assert_eq!(order.items[0].quantity, 3);
    }

    #[test]
    fn test_null_data_is_empty_page() {
        let page: Pagination<Product> =
            serde_json::from_value(json!({ "Count": 0, "Data": null })).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_user_authority_wire_values() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "username": "alice",
            "firstName": "Alice",
            "lastName": "Liddell",
            "authority": 3
        }))
        .unwrap();
        assert_eq!(user.authority, UserAuthority::Admin);
        assert_eq!(user.first_name, "Alice");

        let unknown: UserAuthority = serde_json::from_value(json!(99)).unwrap();
        assert_eq!(unknown, UserAuthority::Unknown);
        assert_eq!(serde_json::to_value(UserAuthority::Tenant).unwrap(), json!(2));
    }

    #[test]
    fn test_login_response_user() {
        let response: LoginResponse = serde_json::from_value(json!({
            "user": { "username": "alice", "nickname": "al" },
            "token": "T1"
        }))
        .unwrap();
        assert_eq!(response.token.as_deref(), Some("T1"));
        assert_eq!(response.user().unwrap().username, "alice");
        assert!(response.err.is_none());
    }
}
