use super::*;
use crate::config::IntakeConfig;
use crate::error::DecodeError;
use crate::media::MediaDecoder;
use std::io::Write;

const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn create_test_intake(max_file_size_mb: u64) -> FileIntake {
    FileIntake::new(&IntakeConfig { max_file_size_mb }, MediaDecoder::default())
}

#[tokio::test]
async fn test_png_is_accepted_as_data_uri() {
    let intake = create_test_intake(10);
    let file = IncomingFile::from_bytes("label.png", "image/png", PNG_HEADER.to_vec());

    let outcome = intake.accept(file).await;

    let uri = outcome.accepted().expect("png should be accepted");
    assert!(uri.to_string().starts_with("data:image/png;base64,"));
    assert_eq!(uri.to_bytes().unwrap(), PNG_HEADER);
}

#[tokio::test]
async fn test_non_image_is_rejected() {
    let intake = create_test_intake(10);
    let file = IncomingFile::from_bytes("notes.txt", "text/plain", b"sugar, salt".to_vec());

    let outcome = intake.accept(file).await;

    assert_eq!(
        outcome,
        IntakeOutcome::Rejected(RejectedKind::NotAnImage {
            media_type: Some("text/plain".to_string())
        })
    );
}

#[tokio::test]
async fn test_declared_type_wins_over_extension() {
    let intake = create_test_intake(10);
    let file = IncomingFile::from_bytes("photo.jpg", "application/octet-stream", vec![1, 2, 3]);

    assert!(!intake.accept(file).await.is_accepted());
}

#[tokio::test]
async fn test_path_without_declared_type_is_guessed() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(PNG_HEADER).unwrap();

    let intake = create_test_intake(10);
    let outcome = intake.accept(IncomingFile::from_path(file.path())).await;

    let uri = outcome.accepted().expect("guessed png should be accepted");
    assert_eq!(uri.mime_type(), "image/png");
}

#[tokio::test]
async fn test_unknown_extension_is_rejected() {
    let file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();

    let intake = create_test_intake(10);
    let outcome = intake.accept(IncomingFile::from_path(file.path())).await;

    assert!(matches!(
        outcome.rejection(),
        Some(RejectedKind::NotAnImage { .. })
    ));
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let intake = create_test_intake(1);
    let bytes = vec![0u8; 1024 * 1024 + 1];
    let file = IncomingFile::from_bytes("huge.png", "image/png", bytes);

    let outcome = intake.accept(file).await;

    assert_eq!(
        outcome,
        IntakeOutcome::Rejected(RejectedKind::TooLarge {
            size: 1024 * 1024 + 1,
            limit: 1024 * 1024
        })
    );
}

#[tokio::test]
async fn test_zero_limit_disables_size_check() {
    let intake = create_test_intake(0);
    assert_eq!(intake.max_bytes(), None);

    let file = IncomingFile::from_bytes("big.png", "image/png", vec![0u8; 2 * 1024 * 1024]);
    assert!(intake.accept(file).await.is_accepted());
}

#[tokio::test]
async fn test_missing_file_reports_decode_failure() {
    let intake = create_test_intake(10);
    let file = IncomingFile::from_path("/nonexistent/label.png");

    let outcome = intake.accept(file).await;

    assert!(matches!(
        outcome.rejection(),
        Some(RejectedKind::DecodeFailed(DecodeError::Read { .. }))
    ));
}

#[test]
fn test_drop_zone_highlight() {
    let mut zone = DropZone::new();
    assert!(!zone.is_drag_active());

    assert!(zone.handle(DragEvent::Enter).is_none());
    assert!(zone.is_drag_active());

    zone.handle(DragEvent::Over);
    assert!(zone.is_drag_active());

    zone.handle(DragEvent::Leave);
    assert!(!zone.is_drag_active());
}

#[test]
fn test_drop_takes_first_file() {
    let mut zone = DropZone::new();
    zone.handle(DragEvent::Enter);

    let dropped = zone.handle(DragEvent::Drop(vec![
        IncomingFile::from_bytes("a.png", "image/png", vec![1]),
        IncomingFile::from_bytes("b.png", "image/png", vec![2]),
    ]));

    assert_eq!(dropped.map(|f| f.name), Some("a.png".to_string()));
    assert!(!zone.is_drag_active());
}

#[test]
fn test_empty_declared_type_falls_back_to_name() {
    let file = IncomingFile::from_bytes("scan.jpeg", "", vec![]);
    assert_eq!(file.media_type().as_deref(), Some("image/jpeg"));
}
