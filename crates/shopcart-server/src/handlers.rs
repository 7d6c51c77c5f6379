//! Request handlers: route a request event to the cart engine and
//! translate the outcome into a response.

use serde_json::{Value, json};
use shopcart_cart::{CartConfig, CartIdentity, CartService};
use shopcart_core::error::{CartError, CartResult};
use shopcart_core::models::order::Order;
use shopcart_core::repository::{
    OrderRepository, ProductRepository, UserRepository,
};
use shopcart_db::repository::{
    SurrealOrderRepository, SurrealProductRepository, SurrealUserRepository,
};
use surrealdb::{Connection, Surreal};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::http::{HttpRequest, HttpResponse, SESSION_COOKIE};
use crate::validation::{self, ValidationError, is_session_id};

/// Resolved caller: the cart identity plus whether the session id was
/// minted for this request and must be handed back as a cookie.
struct Caller {
    identity: CartIdentity,
    new_session: Option<String>,
}

impl Caller {
    fn user_id(&self) -> Option<Uuid> {
        self.identity.user_id
    }
}

pub struct App<O: OrderRepository, P: ProductRepository, U: UserRepository> {
    cart: CartService<O, P>,
    users: U,
}

impl<C: Connection>
    App<SurrealOrderRepository<C>, SurrealProductRepository<C>, SurrealUserRepository<C>>
{
    /// Wire every repository to the same store handle.
    pub fn from_db(db: Surreal<C>, config: CartConfig) -> Self {
        Self::new(
            CartService::new(
                SurrealOrderRepository::new(db.clone()),
                SurrealProductRepository::new(db.clone()),
                config,
            ),
            SurrealUserRepository::new(db),
        )
    }
}

impl<O: OrderRepository, P: ProductRepository, U: UserRepository> App<O, P, U> {
    pub fn new(cart: CartService<O, P>, users: U) -> Self {
        Self { cart, users }
    }

    pub fn cart(&self) -> &CartService<O, P> {
        &self.cart
    }

    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        let method = request.http_method.to_ascii_uppercase();
        info!(method = %method, path = %request.path, "Received request");

        let body = match request.body.as_deref().map(str::trim) {
            None | Some("") => Value::Null,
            Some(raw) => match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(_) => {
                    return HttpResponse::message(400, "Invalid JSON format in request body.");
                }
            },
        };

        match format!("{method}-{}", request.path).as_str() {
            "GET-/order" => self.get_order(&request, &body).await,
            "POST-/order" => self.add_item(&request, &body).await,
            "PUT-/order/product" => self.set_quantity(&request, &body).await,
            "DELETE-/order/product" => self.remove_item(&request, &body).await,
            "POST-/order/checkout" => self.checkout(&request, &body).await,
            "POST-/order/complete" => self.complete(&request, &body).await,
            "POST-/order/cancel" => self.cancel(&request, &body).await,
            _ => HttpResponse::not_found_route(&request.path, &request.http_method),
        }
    }

    async fn get_order(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong getting the order";
        let input = match validation::session(body) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self.cart.get_details(&caller.identity).await;
        respond(result, caller, FAILURE)
    }

    async fn add_item(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong adding product to order";
        let input = match validation::item(body, 1) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self
            .cart
            .add_item(&caller.identity, input.product_id, input.quantity)
            .await;
        respond(result, caller, FAILURE)
    }

    async fn set_quantity(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong updating product quantity";
        let input = match validation::item(body, 0) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self
            .cart
            .set_item_quantity(&caller.identity, input.product_id, input.quantity)
            .await;
        respond(result, caller, FAILURE)
    }

    async fn remove_item(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong removing product from order";
        let input = match validation::remove(body) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        if let Err(e) = self.cart.products().get_by_id(input.product_id).await {
            return error_response(e, FAILURE);
        }
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self
            .cart
            .remove_item(&caller.identity, input.product_id)
            .await;
        respond(result, caller, FAILURE)
    }

    async fn checkout(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong doing checkout of the order";
        let input = match validation::checkout(body) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        if let Err(e) = self.cart.orders().get_by_id(input.order_id).await {
            return error_response(e, FAILURE);
        }
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        info!(order_id = %input.order_id, "Starting checkout");
        let result = self
            .cart
            .checkout(&caller.identity, input.details, caller.user_id())
            .await;
        respond(result, caller, FAILURE)
    }

    async fn complete(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong completing the order";
        let input = match validation::session(body) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self
            .cart
            .complete(&caller.identity, caller.user_id())
            .await;
        respond(result, caller, FAILURE)
    }

    async fn cancel(&self, request: &HttpRequest, body: &Value) -> HttpResponse {
        const FAILURE: &str = "Something went wrong cancelling the order";
        let input = match validation::session(body) {
            Ok(input) => input,
            Err(e) => return validation_response(e),
        };
        let caller = match self.caller(request, input.session_id).await {
            Ok(caller) => caller,
            Err(e) => return error_response(e, FAILURE),
        };

        let result = self
            .cart
            .cancel(&caller.identity, caller.user_id())
            .await;
        respond(result, caller, FAILURE)
    }

    /// Session id from the body, else the session cookie, else a fresh
    /// one. An unknown subject is treated as an anonymous caller.
    async fn caller(&self, request: &HttpRequest, body_session: Option<String>) -> CartResult<Caller> {
        let cookie_session = request
            .cookie(SESSION_COOKIE)
            .filter(|s| is_session_id(s));

        let (session_id, new_session) = match body_session.or(cookie_session) {
            Some(session_id) => (session_id, None),
            None => {
                let minted = Uuid::new_v4().to_string();
                (minted.clone(), Some(minted))
            }
        };

        let user_id = match request.user_sub.as_deref() {
            Some(sub) => match self.users.get_by_sub(sub).await {
                Ok(user) => Some(user.id),
                Err(CartError::NotFound { .. }) => {
                    warn!(sub = %sub, "No user for subject; treating caller as anonymous");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok(Caller {
            identity: CartIdentity::new(user_id, Some(session_id)),
            new_session,
        })
    }
}

fn respond(result: CartResult<Order>, caller: Caller, failure: &str) -> HttpResponse {
    let response = match result {
        Ok(order) => HttpResponse::json(200, &order),
        Err(e) => error_response(e, failure),
    };
    match caller.new_session {
        Some(session_id) => response.with_session_cookie(&session_id),
        None => response,
    }
}

fn validation_response(err: ValidationError) -> HttpResponse {
    HttpResponse::json(
        400,
        &json!({ "message": "Validation error", "details": err.details }),
    )
}

/// Translate an engine error by its tag. Infrastructure details are
/// logged, never returned.
fn error_response(err: CartError, failure: &str) -> HttpResponse {
    let status = err.status_code();
    match err {
        CartError::Validation { message } => HttpResponse::json(
            status,
            &json!({ "message": "Validation error", "details": [message] }),
        ),
        CartError::NotFound { entity, .. } => {
            HttpResponse::message(status, &format!("{} not found", capitalize(&entity)))
        }
        e @ CartError::InvalidState { .. } => HttpResponse::message(status, &e.to_string()),
        CartError::Infrastructure(detail) => {
            error!(error = %detail, "{failure}");
            HttpResponse::message(status, failure)
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use shopcart_core::lifecycle::CartOperation;
    use shopcart_core::models::order::OrderStatus;

    use super::*;

    #[test]
    fn errors_map_to_status_and_message() {
        let not_found = error_response(CartError::not_found("product", "p1"), "x");
        assert_eq!(not_found.status_code, 404);
        assert_eq!(not_found.body_json()["message"], "Product not found");

        let invalid = error_response(
            CartError::InvalidState {
                operation: CartOperation::Checkout,
                status: OrderStatus::Completed,
            },
            "x",
        );
        assert_eq!(invalid.status_code, 409);
        assert_eq!(
            invalid.body_json()["message"],
            "Cannot check out an order in status completed"
        );

        let infra = error_response(
            CartError::Infrastructure("socket closed at 10.0.0.3".into()),
            "Something went wrong",
        );
        assert_eq!(infra.status_code, 500);
        assert!(!infra.body.contains("10.0.0.3"));
    }
}
