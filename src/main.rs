//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let company_routes = Router::new()
        .route(
            "/",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/categories",
            post(handlers::companies::create_category)
                .get(handlers::companies::list_categories),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::purchase_orders::create_product)
                .get(handlers::purchase_orders::list_products),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let purchase_order_routes = Router::new()
        .route(
            "/",
            post(handlers::purchase_orders::create_purchase_order)
                .get(handlers::purchase_orders::list_purchase_orders),
        )
        .route(
            "/{id}/products/{product_id}/saldo",
            get(handlers::purchase_orders::get_saldo),
        )
        .route(
            "/{id}/products/{product_id}/entregue",
            get(handlers::purchase_orders::get_entregue),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // O ciclo de vida completo da ordem de entrega mora aqui
    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/urgent", get(handlers::orders::list_urgent_orders))
        .route(
            "/{id}",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/{id}/approve", put(handlers::orders::approve_order))
        .route("/{id}/reject", put(handlers::orders::reject_order))
        .route("/{id}/documents", post(handlers::orders::upload_documents))
        .route("/{id}/tracking", post(handlers::orders::register_tracking_point))
        .route("/{id}/confirmar", post(handlers::orders::confirm_delivery))
        .route("/{id}/reprogramar", post(handlers::orders::request_reprogramacao))
        .route(
            "/{id}/reprogramacao/aprovar",
            put(handlers::orders::approve_reprogramacao),
        )
        .route(
            "/{id}/reprogramacao/rejeitar",
            put(handlers::orders::reject_reprogramacao),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let audit_routes = Router::new()
        .route("/", get(handlers::companies::list_audit_logs))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/companies", company_routes)
        .nest("/api/products", product_routes)
        .nest("/api/purchase-orders", purchase_order_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/audit-logs", audit_routes)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
