use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// Serves CSV bytes as a `results.csv` download.
pub fn csv_attachment(body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"results.csv\"",
            ),
        ],
        Bytes::from(body),
    )
        .into_response()
}
