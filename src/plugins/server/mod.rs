mod handlers;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();

    let router = Router::new()
      .route("/health", get(handlers::health))
      // challenges
      .route("/api/challenges", get(handlers::list_challenges))
      .route("/api/challenges", post(handlers::create_challenge))
      .route("/api/challenges/{id}", get(handlers::get_challenge))
      .route("/api/challenges/{id}", patch(handlers::update_challenge))
      .route("/api/challenges/{id}", delete(handlers::delete_challenge))
      .route("/api/challenges/code/{code}", get(handlers::get_by_code))
      .route("/api/challenges/{id}/publish", post(handlers::publish_challenge))
      .route("/api/challenges/{id}/status", post(handlers::change_status))
      // participation
      .route("/api/challenges/{id}/join", post(handlers::join))
      .route("/api/challenges/{id}/leave", post(handlers::leave))
      .route("/api/challenges/{id}/approve", post(handlers::approve))
      .route("/api/challenges/{id}/reject", post(handlers::reject))
      .route("/api/challenges/{id}/disqualify", post(handlers::disqualify))
      .route("/api/progress", post(handlers::submit_progress))
      // leaderboards and read models
      .route("/api/challenges/{id}/leaderboard", get(handlers::leaderboard))
      .route(
        "/api/challenges/{id}/leaderboard/{user_id}",
        get(handlers::user_rank),
      )
      .route("/api/challenges/{id}/stats", get(handlers::leaderboard_stats))
      .route("/api/challenges/{id}/completion", get(handlers::completion_stats))
      .route("/api/challenges/{id}/results", get(handlers::results))
      // teams
      .route("/api/challenges/{id}/teams", post(handlers::create_team))
      .route("/api/challenges/{id}/teams", get(handlers::list_teams))
      .route(
        "/api/challenges/{id}/team-leaderboard",
        get(handlers::team_leaderboard),
      )
      .route("/api/teams/{id}/members", post(handlers::add_member))
      .route(
        "/api/teams/{id}/members/{user_id}",
        delete(handlers::remove_member),
      )
      .route("/api/teams/{id}/contributions", post(handlers::contribute))
      // invitations
      .route("/api/challenges/{id}/invitations", post(handlers::send_invitation))
      .route("/api/challenges/{id}/invitations", get(handlers::list_invitations))
      .route("/api/invitations/{id}/respond", post(handlers::respond_invitation))
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .with_state(app)
      .into_make_service_with_connect_info::<SocketAddr>();

    let port: u16 =
      std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .context("Failed to bind HTTP listener")?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
            Ok(_) => info!("Server stopped gracefully"),
            Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}
