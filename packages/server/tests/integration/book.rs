use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use crate::common::memory::FailingBookStore;
use crate::common::{TestApp, payload, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn epub_upload_is_stored_under_the_owner() {
        let app = TestApp::spawn().await;

        let res = app.upload("notes.epub", payload(1000), 7).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["user_id"], 7);
        assert_eq!(res.body["title"], "notes");
        assert_eq!(res.body["filename"], "notes.epub");
        assert_eq!(res.body["format"], "epub");
        assert_eq!(res.body["file_size"], 1000);
        assert_eq!(res.body["current_page"], 0);
        assert_eq!(res.body["progress_percentage"], 0.0);

        let file_path = PathBuf::from(res.body["file_path"].as_str().unwrap());
        assert_eq!(file_path.parent().unwrap(), app.user_dir(7));
        assert!(file_path.to_string_lossy().ends_with(".epub"));
        assert_eq!(std::fs::read(&file_path).unwrap(), payload(1000));
    }

    #[tokio::test]
    async fn format_and_title_follow_the_filename() {
        let app = TestApp::spawn().await;

        let pdf = app.upload("My Book.v2.PDF", payload(10), 1).await;
        assert_eq!(pdf.status, 201, "{}", pdf.text);
        assert_eq!(pdf.body["format"], "pdf");
        assert_eq!(pdf.body["title"], "My Book.v2");

        let org = app.upload("todo.org", b"* TODO read".to_vec(), 1).await;
        assert_eq!(org.status, 201, "{}", org.text);
        assert_eq!(org.body["format"], "org");
    }

    #[tokio::test]
    async fn same_filename_twice_gives_two_books() {
        let app = TestApp::spawn().await;

        let first = app.create_book("same.pdf", payload(5), 2).await;
        let second = app.create_book("same.pdf", payload(6), 2).await;

        assert_ne!(first, second);
        assert_eq!(app.stored_files(2).len(), 2);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_without_touching_storage() {
        let app = TestApp::spawn().await;

        let res = app.upload("malware.exe", payload(10), 3).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "File type not allowed. Allowed types: .pdf,.epub,.org"
        );
        assert!(!app.user_dir(3).exists());
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_field("document", "notes.pdf", payload(10), Some(4))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_user_header_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload_field("file", "notes.pdf", payload(10), None).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_numeric_user_header_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::BOOKS))
            .header("X-User-ID", "seven")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn failed_record_insert_removes_the_stored_file() {
        let app = TestApp::spawn_with_books(Arc::new(FailingBookStore)).await;

        let res = app.upload("notes.epub", payload(100), 5).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert!(
            app.stored_files(5).is_empty(),
            "orphan blob left behind: {:?}",
            app.stored_files(5)
        );
    }
}

mod retrieval {
    use super::*;

    #[tokio::test]
    async fn owner_can_fetch_a_book() {
        let app = TestApp::spawn().await;
        let id = app.create_book("guide.pdf", payload(20), 7).await;

        let res = app.get(&routes::book(id), Some(7)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["title"], "guide");
    }

    #[tokio::test]
    async fn another_users_book_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_book("guide.pdf", payload(20), 7).await;

        let res = app.get(&routes::book(id), Some(9)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::book(999), Some(7)).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let app = TestApp::spawn().await;

        for path in ["/api/v1/books/abc", "/api/v1/books/99999999999"] {
            let res = app.get(path, Some(7)).await;
            assert_eq!(res.status, 400, "{path}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR", "{path}: {}", res.text);
            assert!(res.body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn malformed_id_on_delete_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.delete("/api/v1/books/1.5", Some(7)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped_to_the_owner() {
        let app = TestApp::spawn().await;
        let first = app.create_book("one.pdf", payload(1), 7).await;
        let second = app.create_book("two.epub", payload(2), 7).await;
        app.create_book("other.org", payload(3), 8).await;

        let res = app.get(routes::BOOKS, Some(7)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        let ids: Vec<i64> = res.body["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn listing_with_no_books_is_empty() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::BOOKS, Some(42)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 0);
        assert_eq!(res.body["books"], json!([]));
    }

    #[tokio::test]
    async fn download_streams_the_stored_bytes() {
        let app = TestApp::spawn().await;
        let id = app.create_book("notes.epub", payload(1000), 7).await;

        let res = app.get(&routes::download(id), Some(7)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.text.as_bytes(), payload(1000).as_slice());
        assert_eq!(res.header("content-type"), Some("application/epub+zip"));
        assert_eq!(res.header("content-length"), Some("1000"));
        assert!(
            res.header("content-disposition")
                .unwrap()
                .contains("filename=\"notes.epub\"")
        );
    }

    #[tokio::test]
    async fn download_of_another_users_book_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_book("notes.epub", payload(10), 7).await;

        let res = app.get(&routes::download(id), Some(9)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn download_with_a_missing_file_reports_file_missing() {
        let app = TestApp::spawn().await;
        let id = app.create_book("notes.epub", payload(10), 7).await;
        for file in app.stored_files(7) {
            std::fs::remove_file(file).unwrap();
        }

        let res = app.get(&routes::download(id), Some(7)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "FILE_MISSING");

        // The record itself is still there.
        let book = app.get(&routes::book(id), Some(7)).await;
        assert_eq!(book.status, 200);
    }
}

mod progress {
    use super::*;

    #[tokio::test]
    async fn owner_can_record_progress() {
        let app = TestApp::spawn().await;
        let id = app.create_book("novel.epub", payload(50), 7).await;

        let res = app
            .put_json(
                &routes::progress(id),
                &json!({"current_page": 12, "progress_percentage": 37.5}),
                Some(7),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["message"].is_string());

        let book = app.get(&routes::book(id), Some(7)).await;
        assert_eq!(book.body["current_page"], 12);
        assert_eq!(book.body["progress_percentage"], 37.5);
        assert_eq!(book.body["title"], "novel");
        assert_eq!(book.body["file_size"], 50);
    }

    #[tokio::test]
    async fn bounds_are_inclusive() {
        let app = TestApp::spawn().await;
        let id = app.create_book("novel.epub", payload(5), 7).await;

        for (page, pct) in [(0, 0.0), (500, 100.0)] {
            let res = app
                .put_json(
                    &routes::progress(id),
                    &json!({"current_page": page, "progress_percentage": pct}),
                    Some(7),
                )
                .await;
            assert_eq!(res.status, 200, "{page}/{pct}: {}", res.text);
        }
    }

    #[tokio::test]
    async fn out_of_range_values_are_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_book("novel.epub", payload(5), 7).await;

        for body in [
            json!({"current_page": -1, "progress_percentage": 10.0}),
            json!({"current_page": 1, "progress_percentage": 100.5}),
            json!({"current_page": 1, "progress_percentage": -0.1}),
        ] {
            let res = app.put_json(&routes::progress(id), &body, Some(7)).await;
            assert_eq!(res.status, 400, "{body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }

        let book = app.get(&routes::book(id), Some(7)).await;
        assert_eq!(book.body["current_page"], 0);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let id = app.create_book("novel.epub", payload(5), 7).await;

        let res = app
            .put_json(&routes::progress(id), &json!({"current_page": "ten"}), Some(7))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn another_users_book_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_book("novel.epub", payload(5), 7).await;

        let res = app
            .put_json(
                &routes::progress(id),
                &json!({"current_page": 3, "progress_percentage": 5.0}),
                Some(9),
            )
            .await;

        assert_eq!(res.status, 404);

        let book = app.get(&routes::book(id), Some(7)).await;
        assert_eq!(book.body["current_page"], 0);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn only_the_owner_can_delete_and_the_file_goes_with_the_book() {
        let app = TestApp::spawn().await;
        let upload = app.upload("notes.epub", payload(1000), 7).await;
        assert_eq!(upload.status, 201, "{}", upload.text);
        let id = upload.body["id"].as_i64().unwrap();
        let file_path = PathBuf::from(upload.body["file_path"].as_str().unwrap());

        let foreign = app.delete(&routes::book(id), Some(9)).await;
        assert_eq!(foreign.status, 404);
        assert!(file_path.exists());

        let res = app.delete(&routes::book(id), Some(7)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["message"].is_string());
        assert!(!file_path.exists());

        let gone = app.get(&routes::book(id), Some(7)).await;
        assert_eq!(gone.status, 404);

        let list = app.get(routes::BOOKS, Some(7)).await;
        assert_eq!(list.body["total"], 0);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_book("notes.epub", payload(10), 7).await;

        assert_eq!(app.delete(&routes::book(id), Some(7)).await.status, 200);
        assert_eq!(app.delete(&routes::book(id), Some(7)).await.status, 404);
    }

    #[tokio::test]
    async fn succeeds_when_the_file_is_already_gone() {
        let app = TestApp::spawn().await;
        let id = app.create_book("notes.epub", payload(10), 7).await;
        for file in app.stored_files(7) {
            std::fs::remove_file(file).unwrap();
        }

        let res = app.delete(&routes::book(id), Some(7)).await;

        assert_eq!(res.status, 200);
        assert_eq!(app.get(&routes::book(id), Some(7)).await.status, 404);
    }
}
