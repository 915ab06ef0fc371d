use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::domain::account::{Session, User};
use crate::errors::AppError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "storefront_session";

/// The user behind the request's session cookie. Extraction fails with 401
/// when the cookie is missing, malformed, unknown or expired.
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let session_id = session_id(req);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;
            let session_id = session_id.ok_or(AppError::Unauthorized)?;

            let user = web::block(move || state.accounts.authenticate(session_id))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok::<_, AppError>(CurrentUser(user))
        })
    }
}

pub fn session_id(req: &HttpRequest) -> Option<Uuid> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

pub fn session_cookie(session: &Session, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session.id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .finish()
}

pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: 1,
            expires_at: Utc::now() + Duration::hours(2),
        };

        let cookie = session_cookie(&session, Duration::hours(2), true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), session.id.to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(2)));
    }

    #[test]
    fn malformed_cookie_yields_no_session() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "not-a-uuid"))
            .to_http_request();
        assert!(session_id(&req).is_none());

        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, id.to_string()))
            .to_http_request();
        assert_eq!(session_id(&req), Some(id));
    }
}
