// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Profile, User},
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, created_at, updated_at";

// O repositório de usuários, responsável pelas tabelas 'users' e 'profiles'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (ou username, que no cadastro é o mesmo valor)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Cria um novo usuário; e-mail duplicado vira `EmailAlreadyExists`
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name)
             VALUES ($1, $1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::EmailAlreadyExists;
                    }
                }
                e.into()
            })
    }

    pub async fn update_names<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE users
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(executor)
            .await?;
        Ok(user)
    }

    // =========================================================================
    //  PERFIL
    // =========================================================================

    pub async fn create_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        company: Option<&str>,
    ) -> Result<Profile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, company)
            VALUES ($1, $2)
            RETURNING user_id, company, phone, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(company)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    pub async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, company, phone, created_at, updated_at FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    // UPSERT: contas antigas podem não ter perfil
    pub async fn upsert_profile<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        company: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Profile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, company, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET
                company = COALESCE(EXCLUDED.company, profiles.company),
                phone = COALESCE(EXCLUDED.phone, profiles.phone),
                updated_at = NOW()
            RETURNING user_id, company, phone, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(company)
        .bind(phone)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }
}
