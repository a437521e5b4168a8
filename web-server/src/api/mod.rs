// web-server/src/api/mod.rs
pub mod auth;
pub mod grant_role;
pub mod session;
pub mod wallet;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api")
            .service(session::get_session_context)
            .service(wallet::connect_wallet)
            .service(wallet::disconnect_wallet)
            .service(wallet::login_payload)
            .service(wallet::login)
            .service(wallet::wallet_user)
            .service(wallet::logout)
            .service(auth::signin_discord)
            .service(auth::callback_discord)
            .service(auth::get_session)
            .service(auth::signout)
            .service(grant_role::grant_role)
    );
}
