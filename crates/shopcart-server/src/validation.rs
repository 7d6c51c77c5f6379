//! Request body validation.
//!
//! Bodies deserialize into per-route structs that reject unknown keys.
//! Checks serde cannot express (session id version, quantity floor,
//! non-empty strings, email shape) run afterwards and are reported
//! together.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shopcart_core::models::order::CheckoutDetails;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("request body failed validation ({} problem(s))", details.len())]
pub struct ValidationError {
    pub details: Vec<FieldError>,
}

/// Body of routes that only carry the session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionInput {
    pub session_id: Option<String>,
}

/// Body of add-item and set-quantity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemInput {
    pub product_id: Uuid,
    pub quantity: u32,
    pub session_id: Option<String>,
}

/// Body of remove-item.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveInput {
    pub product_id: Uuid,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CheckoutBody {
    order_id: Uuid,
    session_id: Option<String>,
    payment_method: String,
    delivery_address: String,
    contact_number: String,
    email: String,
    special_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutInput {
    pub order_id: Uuid,
    pub session_id: Option<String>,
    pub details: CheckoutDetails,
}

/// Collects post-deserialization problems.
#[derive(Default)]
struct Problems(Vec<FieldError>);

impl Problems {
    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }

    fn session_id(&mut self, session_id: Option<&str>) {
        self.check(
            session_id.is_none_or(is_session_id),
            "sessionId",
            "must be a UUID v4",
        );
    }

    fn non_empty(&mut self, value: &str, field: &str) {
        self.check(!value.trim().is_empty(), field, "must be a non-empty string");
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { details: self.0 })
        }
    }
}

/// A missing body reads as `{}`.
fn parse<T: DeserializeOwned>(body: &Value) -> Result<T, ValidationError> {
    let body = match body {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(body).map_err(|e| ValidationError {
        details: vec![FieldError {
            field: "body".into(),
            message: e.to_string(),
        }],
    })
}

pub fn is_session_id(raw: &str) -> bool {
    Uuid::parse_str(raw).is_ok_and(|id| id.get_version_num() == 4)
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !raw.chars().any(char::is_whitespace)
}

pub fn session(body: &Value) -> Result<SessionInput, ValidationError> {
    let input: SessionInput = parse(body)?;
    let mut problems = Problems::default();
    problems.session_id(input.session_id.as_deref());
    problems.finish(input)
}

/// `min_quantity` is 1 for add-item and 0 for set-quantity.
pub fn item(body: &Value, min_quantity: u32) -> Result<ItemInput, ValidationError> {
    let input: ItemInput = parse(body)?;
    let mut problems = Problems::default();
    problems.check(
        input.quantity >= min_quantity,
        "quantity",
        &format!("must be an integer >= {min_quantity}"),
    );
    problems.session_id(input.session_id.as_deref());
    problems.finish(input)
}

pub fn remove(body: &Value) -> Result<RemoveInput, ValidationError> {
    let input: RemoveInput = parse(body)?;
    let mut problems = Problems::default();
    problems.session_id(input.session_id.as_deref());
    problems.finish(input)
}

pub fn checkout(body: &Value) -> Result<CheckoutInput, ValidationError> {
    let body: CheckoutBody = parse(body)?;
    let mut problems = Problems::default();
    problems.session_id(body.session_id.as_deref());
    problems.non_empty(&body.payment_method, "paymentMethod");
    problems.non_empty(&body.delivery_address, "deliveryAddress");
    problems.non_empty(&body.contact_number, "contactNumber");
    problems.check(is_email(body.email.trim()), "email", "must be a valid email");

    problems.finish(CheckoutInput {
        order_id: body.order_id,
        session_id: body.session_id,
        details: CheckoutDetails {
            payment_method: body.payment_method.trim().to_string(),
            delivery_address: body.delivery_address.trim().to_string(),
            contact_number: body.contact_number.trim().to_string(),
            email: body.email.trim().to_string(),
            special_instructions: body.special_instructions,
        },
    })
}
