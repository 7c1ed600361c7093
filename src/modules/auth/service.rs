use std::sync::Arc;

use bookshop_authz::{hash_password, verify_password, JwtKeys, Role};
use bookshop_db::DbPool;

use super::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use super::repository::{self, NewUser};
use crate::error::{ShopError, ShopResult};
use crate::modules::cart;
use crate::utils::non_blank;

const DUPLICATE_EMAIL: &str = "User already exist";

/// Registration and login.
#[derive(Clone)]
pub struct UserService {
    db: DbPool,
    keys: Arc<JwtKeys>,
}

impl UserService {
    pub fn new(db: DbPool, keys: Arc<JwtKeys>) -> Self {
        Self { db, keys }
    }

    /// Register a regular customer account.
    pub async fn register(&self, request: RegisterRequest) -> ShopResult<UserResponse> {
        self.create_account(request, &[Role::User]).await
    }

    /// Create a user with the given roles and an empty cart, atomically.
    pub async fn create_account(
        &self,
        request: RegisterRequest,
        roles: &[Role],
    ) -> ShopResult<UserResponse> {
        let email = request.email.trim().to_lowercase();

        {
            let mut conn = self.db.acquire().await?;
            if repository::find_by_email(&mut conn, &email).await?.is_some() {
                tracing::info!(%email, "registration rejected: email taken");
                return Err(ShopError::conflict(DUPLICATE_EMAIL));
            }
        }

        let password_hash = hash_password(&request.password)?;
        let shipping_address = non_blank(request.shipping_address);
        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();

        let mut tx = self.db.begin().await?;
        let user_id = repository::insert(
            &mut tx,
            &NewUser {
                email: &email,
                password_hash: &password_hash,
                first_name: &first_name,
                last_name: &last_name,
                shipping_address: shipping_address.as_deref(),
            },
        )
        .await
        .map_err(|err| ShopError::from_write(err, DUPLICATE_EMAIL))?;

        for role in roles {
            repository::add_role(&mut tx, user_id, *role).await?;
        }
        cart::repository::insert_cart(&mut tx, user_id)
            .await
            .map_err(|err| ShopError::from_write(err, "user already has a cart"))?;

        let record = repository::find_by_email(&mut tx, &email)
            .await?
            .ok_or_else(|| ShopError::not_found(format!("Can't find user: {email}")))?;
        let stored_roles = repository::roles_of(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, %email, roles = ?stored_roles, "user registered");
        Ok(UserResponse::from_record(record, stored_roles))
    }

    /// Verify credentials and issue a bearer token.
    pub async fn login(&self, request: LoginRequest) -> ShopResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();
        let mut conn = self.db.acquire().await?;

        let Some(user) = repository::find_by_email(&mut conn, &email).await? else {
            tracing::info!(%email, "login rejected: unknown email");
            return Err(ShopError::Unauthorized("invalid email or password".into()));
        };

        if !verify_password(&request.password, &user.password_hash) {
            tracing::info!(user_id = user.id, "login rejected: bad password");
            return Err(ShopError::Unauthorized("invalid email or password".into()));
        }

        let roles = repository::roles_of(&mut conn, user.id).await?;
        let token = self
            .keys
            .issue(user.id, &user.email, &roles)
            .map_err(|err| ShopError::Internal(anyhow::anyhow!("failed to sign token: {err}")))?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok(LoginResponse { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            first_name: "Ada".into(),
            last_name: "Reader".into(),
            shipping_address: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn registration_creates_user_with_cart() {
        let state = test_support::state().await;

        let user = state.users().register(request("Reader@Example.com")).await.unwrap();
        assert_eq!(user.email, "reader@example.com");
        assert_eq!(user.roles, vec![Role::User]);
        assert_eq!(user.shipping_address, None);

        let cart = state.carts().get_cart(user.id).await.unwrap();
        assert!(cart.cart_items.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let state = test_support::state().await;
        state.users().register(request("dup@example.com")).await.unwrap();

        let err = state.users().register(request("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let state = test_support::state().await;
        let user = state
            .users()
            .create_account(request("admin@example.com"), &[Role::User, Role::Admin])
            .await
            .unwrap();

        let response = state
            .users()
            .login(LoginRequest {
                email: "admin@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        let claims = state.keys.verify(&response.token).unwrap();
        assert_eq!(claims.uid, user.id);
        assert!(claims.roles.contains(&Role::Admin));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = test_support::state().await;
        state.users().register(request("reader@example.com")).await.unwrap();

        let err = state
            .users()
            .login(LoginRequest {
                email: "reader@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::Unauthorized(_)));
    }
}
