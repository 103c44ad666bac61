// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, UserRepository},
    models::auth::{Claims, CurrentUser, PermissionSet, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, company_repo, jwt_secret, pool }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        nome: &str,
        company_id: Uuid,
        role_id: Uuid,
    ) -> Result<String, AppError> {
        // A empresa e o cargo precisam existir antes de qualquer escrita.
        self.company_repo
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Empresa".into()))?;
        self.user_repo
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cargo".into()))?;

        // Hashing fora da transação (não toca no banco e é caro).
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;
        let new_user = self
            .user_repo
            .create_user(&mut *tx, email, &hashed_password, nome, company_id, role_id)
            .await?;
        tx.commit().await?;

        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    /// Valida o token e resolve o cargo do usuário em um conjunto tipado de
    /// capacidades. O "super-admin" nasce aqui (permissão coringa no cargo),
    /// nunca de um id mágico espalhado pela regra de negócio.
    pub async fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário".into()))?;

        let permissions = self.resolve_permissions(&user).await?;
        Ok(CurrentUser { user, permissions })
    }

    async fn resolve_permissions(&self, user: &User) -> Result<PermissionSet, AppError> {
        let role = self
            .user_repo
            .find_role(user.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cargo".into()))?;
        Ok(PermissionSet::from_slugs(&role.permissions))
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
