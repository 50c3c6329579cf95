use axum::Json;
use axum::extract::Path;
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::dashboard::DashboardPanel;
use crate::error::AppError;
use crate::models::{Course, CourseType, Offering, Registration};
use crate::panel::{PanelEntity, PanelView};
use crate::state::AppState;

type ViewOf<E> = PanelView<<E as PanelEntity>::Row, <E as PanelEntity>::Draft>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/course-types", panel_routes::<CourseType>())
        .nest("/courses", panel_routes::<Course>())
        .nest("/offerings", panel_routes::<Offering>())
        .nest("/registrations", panel_routes::<Registration>())
        .with_state(state)
}

fn panel_routes<E: DashboardPanel>() -> Router<AppState> {
    Router::new()
        .route("/", get(show::<E>).post(add::<E>))
        .route("/refresh", post(refresh::<E>))
        .route("/edit", put(save::<E>))
        .route("/edit/cancel", post(cancel::<E>))
        .route("/{id}/edit", post(edit::<E>))
        .route("/{id}", delete(remove::<E>))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn show<E: DashboardPanel>(State(state): State<AppState>) -> Json<ViewOf<E>> {
    let panel = E::panel(&state.dashboard).lock().await;
    Json(panel.view())
}

async fn refresh<E: DashboardPanel>(
    State(state): State<AppState>,
) -> Result<Json<ViewOf<E>>, AppError> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.refresh().await?;
    Ok(Json(panel.view()))
}

async fn add<E: DashboardPanel>(
    State(state): State<AppState>,
    Json(form): Json<E::Draft>,
) -> Result<(StatusCode, Json<ViewOf<E>>), AppError> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.set_form(form);
    panel.add().await?;
    Ok((StatusCode::CREATED, Json(panel.view())))
}

async fn edit<E: DashboardPanel>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ViewOf<E>>, AppError> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.edit(id)?;
    Ok(Json(panel.view()))
}

async fn save<E: DashboardPanel>(
    State(state): State<AppState>,
    Json(draft): Json<E::Draft>,
) -> Result<Json<ViewOf<E>>, AppError> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.set_draft(draft)?;
    panel.save().await?;
    Ok(Json(panel.view()))
}

async fn cancel<E: DashboardPanel>(State(state): State<AppState>) -> Json<ViewOf<E>> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.cancel();
    Json(panel.view())
}

async fn remove<E: DashboardPanel>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mut panel = E::panel(&state.dashboard).lock().await;
    panel.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
