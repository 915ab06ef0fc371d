use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::account::{NewAccount, Role, Session, User, UserCredentials};
use crate::domain::errors::DomainError;
use crate::domain::ports::AccountRepository;
use crate::schema::{sessions, users};

use super::is_unique_violation;
use super::models::{NewSessionRow, NewUserRow, SessionRow, UserRow};

pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for DieselAccountRepository {
    fn create_user(
        &self,
        account: &NewAccount,
        password_hash: &str,
        role: Role,
    ) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                name: &account.name,
                email: &account.email,
                password_hash,
                role: role.as_str(),
                phone: account.phone.as_deref(),
                address: account.address.as_deref(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Conflict("Email already registered".to_string())
                } else {
                    e.into()
                }
            })?;
        row.try_into()
    }

    fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|row| {
            let password_hash = row.password_hash.clone();
            Ok(UserCredentials {
                user: row.try_into()?,
                password_hash,
            })
        })
        .transpose()
    }

    fn create_session(&self, user_id: i32, ttl: Duration) -> Result<Session, DomainError> {
        let mut conn = self.pool.get()?;
        let now = Utc::now();
        conn.transaction::<_, DomainError, _>(|conn| {
            // Expired sessions are swept per user on every login.
            diesel::delete(
                sessions::table
                    .filter(sessions::user_id.eq(user_id))
                    .filter(sessions::expires_at.le(now)),
            )
            .execute(conn)?;

            let row = diesel::insert_into(sessions::table)
                .values(&NewSessionRow {
                    id: Uuid::new_v4(),
                    user_id,
                    expires_at: now + ttl,
                })
                .returning(SessionRow::as_returning())
                .get_result(conn)?;
            Ok(Session {
                id: row.id,
                user_id: row.user_id,
                expires_at: row.expires_at,
            })
        })
    }

    fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;
        let found = sessions::table
            .inner_join(users::table)
            .filter(sessions::id.eq(session_id))
            .select((SessionRow::as_select(), UserRow::as_select()))
            .first::<(SessionRow, UserRow)>(&mut conn)
            .optional()?;

        match found {
            Some((session, _)) if session.expires_at <= Utc::now() => {
                diesel::delete(sessions::table.find(session.id)).execute(&mut conn)?;
                Ok(None)
            }
            Some((_, user)) => Ok(Some(user.try_into()?)),
            None => Ok(None),
        }
    }

    fn delete_session(&self, session_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(sessions::table.find(session_id)).execute(&mut conn)?;
        Ok(())
    }
}
