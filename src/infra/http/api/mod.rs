pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

use crate::application::resources::Resource;

/// CRUD and search routes for `E`, mounted under `/{collection}`.
pub fn build_resource_router<E: Resource>(state: ApiState<E>) -> Router {
    let collection = format!("/{}", E::KIND.collection());
    let search = format!("{collection}/search");
    let item = format!("{collection}/{{id}}");

    Router::new()
        .route(
            &collection,
            get(handlers::list_resources::<E>).post(handlers::create_resource::<E>),
        )
        .route(&search, get(handlers::list_resources::<E>))
        .route(
            &item,
            get(handlers::get_resource::<E>)
                .put(handlers::update_resource::<E>)
                .delete(handlers::delete_resource::<E>),
        )
        .with_state(state)
}
