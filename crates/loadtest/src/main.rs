use goose::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// `X-Code` values sent to the catch-all route, with the status each must produce.
const ERROR_CODES: &[(Option<&str>, u16)] = &[
    (Some("400"), 400),
    (Some("401"), 401),
    (Some("403"), 403),
    (Some("404"), 404),
    (Some("500"), 500),
    (Some("503"), 503),
    (Some("504"), 504),
    (Some("418"), 404),
    (Some("not-a-number"), 500),
    (None, 404),
];

static NEXT_CODE: AtomicUsize = AtomicUsize::new(0);

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn error_page(user: &mut GooseUser) -> TransactionResult {
    let index = NEXT_CODE.fetch_add(1, Ordering::Relaxed) % ERROR_CODES.len();
    let (code, expected) = ERROR_CODES[index];

    let mut request_builder = user.get_request_builder(&GooseMethod::Get, "/")?;
    if let Some(code) = code {
        request_builder = request_builder.header("X-Code", code);
    }
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .expect_status_code(expected)
        .build();

    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("ErrorPages").register_transaction(transaction!(error_page)),
        )
        .execute()
        .await?;

    Ok(())
}
