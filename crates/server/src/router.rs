use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
///
/// Resource routes live under the `/api/v1` prefix; the root and health
/// check endpoints stay at the top level.
pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .route("/user/register", post(handlers::register_handler))
        .route("/user/login", post(handlers::login_handler))
        .route("/user/me", get(handlers::get_me_handler))
        .route("/user/roles", get(handlers::get_my_roles_handler))
        .route("/user", get(handlers::get_users_handler))
        .route("/user/{user_id}", get(handlers::get_user_handler))
        .route(
            "/role",
            post(handlers::create_role_handler).get(handlers::list_roles_handler),
        )
        .route(
            "/role/{role_id}",
            get(handlers::get_role_handler)
                .put(handlers::update_role_handler)
                .delete(handlers::delete_role_handler),
        )
        .route(
            "/permission",
            post(handlers::create_permission_handler).get(handlers::list_permissions_handler),
        )
        .route(
            "/permission/{permission_id}",
            get(handlers::get_permission_handler)
                .put(handlers::update_permission_handler)
                .delete(handlers::delete_permission_handler),
        )
        .route(
            "/role-permission/assign",
            post(handlers::assign_role_permissions_handler),
        )
        .route(
            "/role-permission/{role_id}",
            get(handlers::list_role_permissions_handler),
        )
        .route("/role-assignment/assign", post(handlers::assign_role_handler))
        .route(
            "/role-assignment/delete",
            delete(handlers::delete_role_assignment_handler),
        )
        .route(
            "/knowledgebase",
            post(handlers::create_knowledge_base_handler)
                .get(handlers::list_knowledge_bases_handler),
        )
        .route(
            "/knowledgebase/{kb_id}",
            get(handlers::get_knowledge_base_handler)
                .put(handlers::update_knowledge_base_handler)
                .delete(handlers::delete_knowledge_base_handler),
        )
        .route(
            "/document",
            post(handlers::create_document_handler)
                .get(handlers::list_documents_handler)
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route(
            "/document/{doc_id}",
            get(handlers::get_document_handler)
                .put(handlers::update_document_handler)
                .delete(handlers::delete_document_handler),
        )
        .route(
            "/department",
            post(handlers::create_department_handler).get(handlers::list_departments_handler),
        )
        .route(
            "/department/{department_id}",
            get(handlers::get_department_handler),
        );

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
