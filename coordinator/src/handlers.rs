use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use common::{
    AskTaskRequest, AskTaskResponse, CompleteTaskRequest, CompleteTaskResponse, JobProgress,
    JobResults,
};
use tower_http::trace::TraceLayer;

use crate::state::Coordinator;

pub fn build_router(state: Coordinator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks/ask", post(ask_task))
        .route("/api/v1/tasks/complete", post(complete_task))
        .route("/api/v1/job", get(get_job))
        .route("/api/v1/job/results", get(get_job_results))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Un worker pide trabajo: map, reduce o nada por ahora
async fn ask_task(
    State(state): State<Coordinator>,
    Json(_req): Json<AskTaskRequest>,
) -> Json<AskTaskResponse> {
    Json(AskTaskResponse {
        task: state.ask_task(),
    })
}

// Un worker reporta que terminó una tarea
async fn complete_task(
    State(state): State<Coordinator>,
    Json(req): Json<CompleteTaskRequest>,
) -> Json<CompleteTaskResponse> {
    Json(state.complete_task(&req))
}

// Avance del job (hace el mismo barrido de leases que Done())
async fn get_job(State(state): State<Coordinator>) -> Json<JobProgress> {
    Json(state.progress())
}

// Lista los archivos de salida ya publicados
async fn get_job_results(State(state): State<Coordinator>) -> Json<JobResults> {
    Json(state.results())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use common::{Assignment, MapResult, ReduceResult};
    use serde::de::DeserializeOwned;
    use std::{collections::BTreeMap, path::PathBuf, time::Duration};
    use tower::ServiceExt;

    fn coordinator(files: &[&str], n_reduce: usize) -> Coordinator {
        Coordinator::new(
            files.iter().map(|f| f.to_string()).collect(),
            n_reduce,
            Duration::from_secs(10),
            PathBuf::from("/tmp/mr-out"),
        )
    }

    async fn call<T: DeserializeOwned>(app: &Router, req: Request<Body>) -> T {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json<B: serde::Serialize>(uri: &str, body: &B) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = build_router(coordinator(&[], 1));
        let resp = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn full_job_over_http() {
        let app = build_router(coordinator(&["a.txt"], 1));

        let ask: AskTaskResponse = call(&app, post_json("/api/v1/tasks/ask", &AskTaskRequest {})).await;
        let map = match ask.task {
            Assignment::Map(spec) => spec,
            other => panic!("se esperaba un map, llegó {:?}", other),
        };
        assert_eq!(map.file_path, "a.txt");

        // con el map en curso no hay nada más que dar
        let ask: AskTaskResponse = call(&app, post_json("/api/v1/tasks/ask", &AskTaskRequest {})).await;
        assert_eq!(ask.task, Assignment::NoTask);

        let mut files = BTreeMap::new();
        files.insert(0, "mr-0-0".to_string());
        let done = CompleteTaskRequest::Map(MapResult {
            task_index: map.index,
            epoch: map.epoch,
            partition_to_file: files,
        });
        let ack: CompleteTaskResponse = call(&app, post_json("/api/v1/tasks/complete", &done)).await;
        assert!(ack.accepted);

        // el mismo reporte otra vez se descarta
        let ack: CompleteTaskResponse = call(&app, post_json("/api/v1/tasks/complete", &done)).await;
        assert!(!ack.accepted);

        let ask: AskTaskResponse = call(&app, post_json("/api/v1/tasks/ask", &AskTaskRequest {})).await;
        let reduce = match ask.task {
            Assignment::Reduce(spec) => spec,
            other => panic!("se esperaba un reduce, llegó {:?}", other),
        };
        assert_eq!(reduce.intermediate_files, vec!["mr-0-0".to_string()]);

        let progress: JobProgress = call(&app, get_req("/api/v1/job")).await;
        assert!(!progress.done);
        assert_eq!(progress.maps_completed, 1);

        let done = CompleteTaskRequest::Reduce(ReduceResult {
            task_index: reduce.index,
            epoch: reduce.epoch,
            output_file: None,
        });
        let ack: CompleteTaskResponse = call(&app, post_json("/api/v1/tasks/complete", &done)).await;
        assert!(ack.accepted);

        let progress: JobProgress = call(&app, get_req("/api/v1/job")).await;
        assert!(progress.done);
        assert_eq!(progress.stale_reports, 1);

        let results: JobResults = call(&app, get_req("/api/v1/job/results")).await;
        assert_eq!(results.output_dir, "/tmp/mr-out");
        assert_eq!(results.files, vec!["/tmp/mr-out/mr-out-0".to_string()]);
    }

    #[tokio::test]
    async fn malformed_completion_is_a_client_error() {
        let app = build_router(coordinator(&["a.txt"], 1));
        let req = Request::post("/api/v1/tasks/complete")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"kind":"SHUFFLE"}"#))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }
}
