use crate::{
    conf::settings,
    pkg::{
        internal::email::{SendEmail, authtoken::AuthnCodeTemplate},
        server::state::AppState,
    },
    prelude::Result,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::prelude::{FromRow, Type};
use standard_error::StandardError;
use uuid::Uuid;

pub const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "token_status", rename_all = "lowercase")]
pub enum TokenStatus {
    Pending,
    Verified,
    Rejected,
    Expired,
}

#[derive(FromRow, Debug)]
pub struct AuthToken {
    pub token: Uuid,
    pub user_id: String,
    pub code: String,
    pub expiry: DateTime<Utc>,
    pub status: TokenStatus,
}

#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug)]
pub enum VerifyOutcome {
    Verified(Uuid),
    Invalid,
    Reissued,
}

pub fn name_from_email(email: &str) -> String {
    let (name, _) = email.split_once('@').unwrap_or(("unknown", ""));
    name.to_string()
}

impl User {
    pub async fn create(state: &AppState, email: &str, name: &str) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET name = $2
            RETURNING user_id, email, name
            "#,
        )
        .bind(email.trim().to_lowercase())
        .bind(name)
        .bind(Uuid::new_v4().to_string())
        .fetch_one(&*state.db_pool)
        .await?;
        Ok(user)
    }

    pub async fn retrieve(state: &AppState, email: &str) -> Result<Option<Self>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            select user_id, email, name from users
            where email = lower($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&*state.db_pool)
        .await?)
    }

    /// emails a fresh code, with a magic link that lands on `next`
    pub async fn issue_token(&self, state: &AppState, next: &str) -> Result<()> {
        let pool = &*state.db_pool;
        let code = AuthToken::generate_code();
        tracing::debug!("issued code for {}", &self.email);
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, code, expiry, status)
            VALUES ($1, $2, NOW() + interval '1 hour', $3)
            "#,
        )
        .bind(&self.user_id)
        .bind(&code)
        .bind(TokenStatus::Pending)
        .execute(pool)
        .await?;
        AuthnCodeTemplate {
            name: &self.name,
            code: &code,
            base_url: &settings.base_url,
            email: &self.email,
            next,
        }
        .send(&self.email)?;
        Ok(())
    }

    pub fn is_reviewer(&self) -> bool {
        settings.is_reviewer(&self.email)
    }
}

impl AuthToken {
    fn generate_code() -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH).map(|_| rng.random_range(0..10).to_string()).collect()
    }

    pub fn is_well_formed(code: &str) -> bool {
        code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
    }

    pub async fn issue_user_token(state: &AppState, email: &str, name: &str, next: &str) -> Result<User> {
        let user = User::create(state, email, name).await?;
        user.issue_token(state, next).await?;
        Ok(user)
    }

    /// Checks `code` against the newest live code of `email`. A wrong code
    /// burns every pending code; a missing one triggers a new email.
    pub async fn verify_code(state: &AppState, email: &str, code: &str, next: &str) -> Result<VerifyOutcome> {
        let pool = &*state.db_pool;
        let code = code.trim();
        let user = match User::retrieve(state, email).await? {
            Some(user) => user,
            None => return Ok(VerifyOutcome::Invalid),
        };
        let token = sqlx::query_as::<_, AuthToken>(
            r#"select token, user_id, code, expiry, status from tokens
            where user_id = $1 and status = $2 and expiry > now()
            order by created_at desc limit 1"#,
        )
        .bind(&user.user_id)
        .bind(TokenStatus::Pending)
        .fetch_optional(pool)
        .await?;
        tracing::debug!("verifying token: {:?}", token.as_ref().map(|t| t.token));
        let Some(token) = token else {
            user.issue_token(state, next).await?;
            return Ok(VerifyOutcome::Reissued);
        };
        if !Self::is_well_formed(code) || token.code != code {
            sqlx::query("update tokens set status = $2 where user_id = $3 and status = $1")
                .bind(TokenStatus::Pending)
                .bind(TokenStatus::Rejected)
                .bind(&user.user_id)
                .execute(pool)
                .await?;
            tracing::warn!("wrong code entered for {}", &user.email);
            return Ok(VerifyOutcome::Invalid);
        }
        sqlx::query("update tokens set status = $2 where token = $1")
            .bind(token.token)
            .bind(TokenStatus::Verified)
            .execute(pool)
            .await?;
        tracing::info!("{} signed in", &user.email);
        Ok(VerifyOutcome::Verified(token.token))
    }

    /// current session: the user behind a verified, unexpired token
    pub async fn check_token_validity(state: &AppState, token_str: &str) -> Result<User> {
        let pool = &*state.db_pool;
        let token = token_str
            .parse::<Uuid>()
            .map_err(|_| StandardError::new("ERR-AUTH-002"))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.email, u.name
            FROM tokens t JOIN users u ON u.user_id = t.user_id
            WHERE t.token = $1
            AND t.status = $2
            AND t.expiry > now()
            "#,
        )
        .bind(token)
        .bind(TokenStatus::Verified)
        .fetch_optional(pool)
        .await?;
        user.ok_or_else(|| StandardError::new("ERR-AUTH-001"))
    }

    pub async fn revoke(state: &AppState, user: &User) -> Result<()> {
        sqlx::query("update tokens set status = $2 where user_id = $3 and status = $1")
            .bind(TokenStatus::Verified)
            .bind(TokenStatus::Expired)
            .bind(&user.user_id)
            .execute(&*state.db_pool)
            .await?;
        tracing::info!("User {} logged out successfully", &user.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..50 {
            let code = AuthToken::generate_code();
            assert!(AuthToken::is_well_formed(&code), "{}", code);
        }
        assert!(!AuthToken::is_well_formed("12a456"));
        assert!(!AuthToken::is_well_formed("12345"));
    }

    #[test]
    fn test_name_from_email() {
        assert_eq!(name_from_email("organizer@example.org"), "organizer");
        assert_eq!(name_from_email("broken"), "unknown");
    }
}
