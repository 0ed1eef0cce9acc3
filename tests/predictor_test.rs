//! Integration tests for the prediction client against a local mock service.
//!
//! Runs with the default `predictor` feature; the mock service uses axum as
//! a dev-dependency.

#[cfg(feature = "predictor")]
mod predictor_tests {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use drill_sensor_agent::monitor::DrillMonitor;
    use drill_sensor_agent::predictor::{
        PredictionClient, PredictorConfig, PredictorError, RulRequest, TemperatureRequest,
    };
    use drill_sensor_agent::stats::create_shared_log;
    use drill_sensor_agent::{BlockingPredictionClient, FeatureWindow, SignalGenerator};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Mock model service: RUL answers with the row count, temperature with
    /// the mean of the flat sequence.
    async fn start_mock() -> SocketAddr {
        let app = Router::new()
            .route(
                "/predict",
                post(|Json(body): Json<RulRequest>| async move {
                    Json(serde_json::json!({ "prediction": body.sequence[0].len() as f64 }))
                }),
            )
            .route(
                "/predict_temp",
                post(|Json(body): Json<TemperatureRequest>| async move {
                    let flat = &body.sequence[0];
                    let mean = flat.iter().sum::<f64>() / flat.len().max(1) as f64;
                    Json(serde_json::json!({ "predictions": [[mean]] }))
                }),
            )
            .route(
                "/broken",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
            )
            .route(
                "/garbage",
                post(|| async { Json(serde_json::json!({ "status": "ok" })) }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    fn window(rows: usize) -> FeatureWindow {
        let mut generator = SignalGenerator::with_seed(21);
        let samples: Vec<_> = (0..rows).map(|_| generator.generate()).collect();
        FeatureWindow::from_samples(&samples)
    }

    #[tokio::test]
    async fn test_predictions_round_trip() {
        let addr = start_mock().await;
        let client = PredictionClient::new(PredictorConfig::new(format!("http://{addr}")))
            .expect("client");
        let window = window(20);

        let rul = client
            .predict_rul(&RulRequest::from_window(&window))
            .await
            .expect("rul prediction");
        assert_eq!(rul, 20.0);

        let temperature = client
            .predict_temperature(&TemperatureRequest::from_window(&window))
            .await
            .expect("temperature prediction");
        let flat = window.temperature_excluded();
        let expected = flat.iter().sum::<f64>() / flat.len() as f64;
        assert!((temperature - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let addr = start_mock().await;
        let config = PredictorConfig {
            rul_path: "/broken".to_string(),
            temperature_path: "/garbage".to_string(),
            ..PredictorConfig::new(format!("http://{addr}"))
        };
        let client = PredictionClient::new(config).expect("client");
        let window = window(3);

        match client.predict_rul(&RulRequest::from_window(&window)).await {
            Err(PredictorError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("model crashed"));
            }
            other => panic!("expected server error, got {other:?}"),
        }

        assert!(matches!(
            client
                .predict_temperature(&TemperatureRequest::from_window(&window))
                .await,
            Err(PredictorError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let config = PredictorConfig {
            timeout_secs: 2,
            ..PredictorConfig::new(format!("http://{addr}"))
        };
        let client = PredictionClient::new(config).expect("client");
        let result = client.predict_rul(&RulRequest::from_window(&window(2))).await;
        assert!(matches!(result, Err(PredictorError::Network(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_monitor_with_blocking_client() {
        let addr = start_mock().await;
        let base_url = format!("http://{addr}");

        // The blocking client owns a runtime, so it lives on a plain thread
        let worker = std::thread::spawn(move || {
            let log = create_shared_log();
            let monitor = DrillMonitor::new(20, log.clone());
            let client =
                BlockingPredictionClient::new(PredictorConfig::new(base_url)).expect("client");

            let mut generator = SignalGenerator::with_seed(8);
            let samples: Vec<_> = (0..30).map(|_| generator.generate()).collect();
            let report = monitor.evaluate(&samples, &client).expect("full window");
            (report, log.stats())
        });

        let (report, stats) = tokio::task::spawn_blocking(move || worker.join())
            .await
            .expect("join task")
            .expect("worker thread");

        assert_eq!(report.rul.value(), Some(20.0));
        assert!(report.temperature.is_available());
        assert_eq!(stats.predictions_succeeded, 2);
        assert_eq!(stats.predictions_failed, 0);
    }
}
