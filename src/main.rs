use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    HttpResponse, http::header,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::{authentication, authorization},
    modules::{
        auth::{
            otp::LogOtpSender,
            service::{AuthConfig, AuthService},
        },
        connection::{repository_pg::ConnectionRepositoryPg, service::ConnectionService},
        conversation::{
            repository_pg::{ConversationRepositoryPg, ParticipantRepositoryPg},
            service::ConversationService,
        },
        event::{payment::PaymentConfig, repository_pg::EventRepositoryPg, service::EventService},
        explore::{repository_pg::ExploreRepositoryPg, service::ExploreService},
        image::{
            handle::serve_media, model::UploadConfig, repository_pg::ImageRepositoryPg,
            service::ImageService,
        },
        matching::{repository_pg::MatchingRepositoryPg, service::MatchingService},
        message::{repository_pg::MessageRepositoryPg, service::MessageService},
        notification::service::NotificationService,
        university::{repository_pg::UniversityRepositoryPg, service::UniversityService},
        user::{repository_pg::UserRepositoryPg, schema::UserRole, service::UserService},
        websocket::{
            handler::websocket_handler, notifier::Notifier, server::WebSocketServer,
            session::MembershipRepo,
        },
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[actix_web::get("/health")]
async fn health_check(db_pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(db_pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().body("Server is running"),
        Err(e) => {
            log::error!("Health check failed: {e}");
            HttpResponse::ServiceUnavailable().body("Database unavailable")
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logging();

    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_pool =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;
    let cache = Arc::new(redis_pool.clone());

    let ws_server = WebSocketServer::new().start();
    let notifier = Notifier::new(ws_server.clone());

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let university_repo = Arc::new(UniversityRepositoryPg::new(db_pool.clone()));
    let image_repo = Arc::new(ImageRepositoryPg::new(db_pool.clone()));
    let connection_repo = Arc::new(ConnectionRepositoryPg::new(db_pool.clone()));
    let matching_repo = Arc::new(MatchingRepositoryPg::new(db_pool.clone()));
    let explore_repo = Arc::new(ExploreRepositoryPg::new(db_pool.clone()));
    let conversation_repo = Arc::new(ConversationRepositoryPg::new(db_pool.clone()));
    let participant_repo = Arc::new(ParticipantRepositoryPg::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepositoryPg::new(db_pool.clone()));
    let event_repo = Arc::new(EventRepositoryPg::new(db_pool.clone()));

    let image_service = ImageService::new(
        image_repo,
        UploadConfig::new(&ENV.upload_dir, &ENV.media_base_url, ENV.max_image_size),
    );
    let university_service = UniversityService::with_dependencies(
        university_repo.clone(),
        cache.clone(),
        ENV.university_cache_ttl,
    );
    let user_service = UserService::with_dependencies(
        user_repo.clone(),
        university_repo.clone(),
        image_service.clone(),
        cache.clone(),
    );
    let auth_service = AuthService::with_dependencies(
        user_repo.clone(),
        university_repo,
        user_service.clone(),
        cache,
        Arc::new(LogOtpSender),
        AuthConfig {
            jwt_secret: ENV.jwt_secret.clone(),
            access_token_expiration: ENV.access_token_expiration,
            refresh_token_expiration: ENV.refresh_token_expiration,
            otp_ttl: ENV.otp_ttl,
            otp_max_requests: ENV.otp_max_requests,
        },
    );
    let connection_service = ConnectionService::with_dependencies(
        connection_repo.clone(),
        user_repo.clone(),
        notifier.clone(),
    );
    let matching_service =
        MatchingService::with_dependencies(matching_repo, user_repo.clone(), notifier.clone());
    let explore_service = ExploreService::with_dependencies(
        explore_repo,
        connection_repo.clone(),
        image_service.clone(),
        ENV.explore_candidate_limit,
    );
    let notification_service = NotificationService::with_dependencies(
        connection_service.clone(),
        matching_service.clone(),
    );
    let conversation_service = ConversationService::with_dependencies(
        conversation_repo.clone(),
        participant_repo.clone(),
        connection_repo,
        notifier.clone(),
    );
    let message_service = MessageService::with_dependencies(
        message_repo,
        conversation_repo,
        participant_repo.clone(),
        notifier,
    );
    let event_service = EventService::with_dependencies(
        event_repo,
        PaymentConfig {
            razorpay_key_secret: ENV.razorpay_key_secret.clone(),
            phonepe_salt_key: ENV.phonepe_salt_key.clone(),
            phonepe_salt_index: ENV.phonepe_salt_index.clone(),
        },
    );

    let membership: MembershipRepo = participant_repo;
    let media_route = format!("{}/{{filename}}", ENV.media_base_url.trim_end_matches('/'));

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        let mut app = App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(redis_pool.clone()))
            .app_data(web::Data::new(ws_server.clone()))
            .app_data(web::Data::new(membership.clone()))
            .app_data(web::Data::new(image_service.clone()))
            .app_data(web::Data::new(university_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(connection_service.clone()))
            .app_data(web::Data::new(matching_service.clone()))
            .app_data(web::Data::new(explore_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(conversation_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(event_service.clone()))
            .service(health_check);

        if ENV.media_base_url.starts_with('/') {
            app = app.route(&media_route, web::get().to(serve_media));
        }

        app.service(
            web::scope("/api/v1")
                .route("/ws", web::get().to(websocket_handler))
                .configure(modules::auth::route::public_api_configure)
                .configure(modules::university::route::public_api_configure)
                .configure(modules::event::route::public_api_configure)
                .service(
                    web::scope("")
                        .wrap(from_fn(authorization(vec![UserRole::User, UserRole::Admin])))
                        .wrap(from_fn(authentication(ENV.jwt_secret.clone())))
                        .configure(modules::image::route::configure)
                        .configure(modules::user::route::configure)
                        .configure(modules::explore::route::configure)
                        .configure(modules::matching::route::configure)
                        .configure(modules::connection::route::configure)
                        .configure(modules::notification::route::configure)
                        .configure(modules::message::route::configure)
                        .configure(modules::conversation::route::configure)
                        .configure(modules::event::route::configure),
                ),
        )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(ENV.workers)
    .run()
    .await
}
