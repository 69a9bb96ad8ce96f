//! Postgres repository tests
//!
//! Every test migrates a fresh schema, so counts and aggregates only see the
//! rows the test itself wrote.

use std::sync::Arc;

use brs_server::{
    config::AppConfig,
    error::AppError,
    models::{
        book::CreateBook,
        rental::{CreateRentRequest, RentListQuery},
        student::CreateStudent,
        Book, Student,
    },
    repository::{RentalStore, RentalTransaction, Repository},
    services::Services,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn setup() -> (Repository, Services) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let schema = format!("brs_test_{}", Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .expect("Failed to create schema");
    admin.close().await;

    let search_path = format!("SET search_path TO {}", schema);
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                sqlx::query(&search_path).execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &AppConfig::default());
    (repository, services)
}

async fn book(repository: &Repository, title: &str, count: i32) -> Book {
    let request = CreateBook {
        title: title.to_string(),
        description: String::new(),
        count,
    };
    repository
        .books
        .create(&request.into_book(Utc::now()))
        .await
        .expect("Failed to create book")
}

async fn student(repository: &Repository, first: &str, last: &str) -> Student {
    let request = CreateStudent {
        card_id: Uuid::new_v4().to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        major: "Ecology".to_string(),
        phone: "555-0100".to_string(),
    };
    repository
        .students
        .create(&request.into_student(Utc::now()))
        .await
        .expect("Failed to create student")
}

async fn rent(services: &Services, student: &Student, books: &[&Book]) -> Uuid {
    services
        .rentals
        .create_rent(CreateRentRequest {
            student_id: student.id,
            book_ids: books.iter().map(|b| b.id).collect(),
        })
        .await
        .expect("Failed to rent")
        .cart_id
}

async fn backdate(repository: &Repository, cart_id: Uuid, created_at: DateTime<Utc>) {
    sqlx::query("UPDATE carts SET created_at = $2 WHERE id = $1")
        .bind(cart_id)
        .bind(created_at)
        .execute(&repository.pool)
        .await
        .expect("Failed to backdate cart");
}

async fn line_item_count(repository: &Repository, cart_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM rents WHERE cart_id = $1")
        .bind(cart_id)
        .fetch_one(&repository.pool)
        .await
        .expect("Failed to count line items")
}

async fn count(repository: &Repository, id: Uuid) -> i32 {
    repository.books.get_by_id(id).await.expect("Failed to get book").count
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

/// Open carts:
/// - Paul Atreides, 17 June 09:00: Dune, Emma
/// - Joan Smith, 17 June 15:00: 100% Ulysses
/// - Chani Kynes, 18 June: Dune Messiah
/// - Joan Smith, 19 June: 1000 Ulysses
///
/// Paul also has a returned cart with Dune.
struct Library {
    services: Services,
    paul: Student,
    chani: Student,
    joan: Student,
}

async fn library() -> Library {
    let (repository, services) = setup().await;
    let paul = student(&repository, "Paul", "Atreides").await;
    let chani = student(&repository, "Chani", "Kynes").await;
    let joan = student(&repository, "Joan", "Smith").await;

    let dune = book(&repository, "Dune", 5).await;
    let emma = book(&repository, "Emma", 5).await;
    let messiah = book(&repository, "Dune Messiah", 5).await;
    let percent = book(&repository, "100% Ulysses", 5).await;
    let thousand = book(&repository, "1000 Ulysses", 5).await;

    let returned = rent(&services, &paul, &[&dune]).await;
    services.rentals.return_books(returned).await.unwrap();

    let cart = rent(&services, &paul, &[&dune, &emma]).await;
    backdate(&repository, cart, at(17, 9)).await;
    let cart = rent(&services, &joan, &[&percent]).await;
    backdate(&repository, cart, at(17, 15)).await;
    let cart = rent(&services, &chani, &[&messiah]).await;
    backdate(&repository, cart, at(18, 12)).await;
    let cart = rent(&services, &joan, &[&thousand]).await;
    backdate(&repository, cart, at(19, 12)).await;

    Library {
        services,
        paul,
        chani,
        joan,
    }
}

impl Library {
    async fn titles(&self, query: RentListQuery) -> Vec<String> {
        let page = self.services.reports.list_rents(&query).await.unwrap();
        assert_eq!(page.pagination.total, page.results.len() as i64);
        let mut titles: Vec<String> = page.results.into_iter().map(|r| r.book_title).collect();
        titles.sort();
        titles
    }
}

#[tokio::test]
#[ignore]
async fn test_duplicate_card_is_conflict() {
    let (repository, _) = setup().await;
    let existing = student(&repository, "Paul", "Atreides").await;

    let mut copy = existing.clone();
    copy.id = Uuid::new_v4();
    let err = repository.students.create(&copy).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_rejected_batch_leaves_counts() {
    let (repository, services) = setup().await;
    let reader = student(&repository, "Paul", "Atreides").await;
    let dune = book(&repository, "Dune", 3).await;
    let emma = book(&repository, "Emma", 1).await;

    let err = services
        .rentals
        .create_rent(CreateRentRequest {
            student_id: reader.id,
            book_ids: vec![dune.id, emma.id, emma.id],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientInventory(_)));

    assert_eq!(count(&repository, dune.id).await, 3);
    assert_eq!(count(&repository, emma.id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_uncommitted_unit_of_work_rolls_back() {
    let (repository, _) = setup().await;
    let reader = student(&repository, "Paul", "Atreides").await;
    let dune = book(&repository, "Dune", 3).await;

    let cart_id = {
        let mut tx = repository.carts.begin().await.unwrap();
        let cart = tx.open_cart(reader.id).await.unwrap();
        tx.add_line_items(cart.id, &[dune.id]).await.unwrap();
        cart.id
        // dropped without commit
    };

    let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(&repository.pool)
        .await
        .unwrap();
    assert_eq!(carts, 0);
    assert_eq!(line_item_count(&repository, cart_id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_rentals_of_last_copy() {
    let (repository, services) = setup().await;
    let dune = book(&repository, "Dune", 1).await;
    let services = Arc::new(services);

    let mut handles = Vec::new();
    for i in 0..2 {
        let reader = student(&repository, "Reader", &i.to_string()).await;
        let services = services.clone();
        handles.push(tokio::spawn(async move {
            services
                .rentals
                .create_rent(CreateRentRequest {
                    student_id: reader.id,
                    book_ids: vec![dune.id],
                })
                .await
        }));
    }

    let mut ok = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::InsufficientInventory(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!((ok, insufficient), (1, 1));
    assert_eq!(count(&repository, dune.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_overlapping_batches() {
    let (repository, services) = setup().await;
    let dune = book(&repository, "Dune", 3).await;
    let emma = book(&repository, "Emma", 3).await;
    let services = Arc::new(services);

    let mut handles = Vec::new();
    for i in 0..8 {
        let reader = student(&repository, "Reader", &i.to_string()).await;
        // half of the requests name the books in the opposite order
        let book_ids = if i % 2 == 0 {
            vec![dune.id, emma.id]
        } else {
            vec![emma.id, dune.id]
        };
        let services = services.clone();
        handles.push(tokio::spawn(async move {
            services
                .rentals
                .create_rent(CreateRentRequest {
                    student_id: reader.id,
                    book_ids,
                })
                .await
        }));
    }

    let mut carts = Vec::new();
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(response) => carts.push(response.cart_id),
            Err(AppError::InsufficientInventory(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!((carts.len(), insufficient), (3, 5));
    assert_eq!(count(&repository, dune.id).await, 0);
    assert_eq!(count(&repository, emma.id).await, 0);
    for cart in carts {
        assert_eq!(line_item_count(&repository, cart).await, 2);
    }
}

#[tokio::test]
#[ignore]
async fn test_return_then_second_return() {
    let (repository, services) = setup().await;
    let reader = student(&repository, "Winston", "Smith").await;
    let novel = book(&repository, "1984", 5).await;

    let cart_id = rent(&services, &reader, &[&novel, &novel]).await;
    assert_eq!(count(&repository, novel.id).await, 3);
    assert_eq!(line_item_count(&repository, cart_id).await, 2);

    services.rentals.return_books(cart_id).await.unwrap();
    assert_eq!(count(&repository, novel.id).await, 5);

    let err = services.rentals.return_books(cart_id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyClosed(_)));
    assert_eq!(count(&repository, novel.id).await, 5);
}

#[tokio::test]
#[ignore]
async fn test_rent_listing_filters() {
    let lib = library().await;

    let all = lib.titles(RentListQuery::default()).await;
    assert_eq!(all, ["1000 Ulysses", "100% Ulysses", "Dune", "Dune Messiah", "Emma"]);

    let by_title = lib
        .titles(RentListQuery {
            book_name: Some(" DUNE ".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(by_title, ["Dune", "Dune Messiah"]);

    // LIKE wildcards in the term are literal
    let escaped = lib
        .titles(RentListQuery {
            book_name: Some("100%".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(escaped, ["100% Ulysses"]);

    let first_name = lib
        .titles(RentListQuery {
            student_name: Some("paul".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(first_name, ["Dune", "Emma"]);

    let last_name = lib
        .titles(RentListQuery {
            student_name: Some("Kynes".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(last_name, ["Dune Messiah"]);

    let full_name = lib
        .titles(RentListQuery {
            student_name: Some("\"Joan Smith\"".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(full_name, ["1000 Ulysses", "100% Ulysses"]);

    let by_day = lib
        .titles(RentListQuery {
            date: Some(june(17)),
            ..Default::default()
        })
        .await;
    assert_eq!(by_day, ["100% Ulysses", "Dune", "Emma"]);

    let title_and_day = lib
        .titles(RentListQuery {
            book_name: Some("dune".into()),
            date: Some(june(18)),
            ..Default::default()
        })
        .await;
    assert_eq!(title_and_day, ["Dune Messiah"]);

    let title_and_name = lib
        .titles(RentListQuery {
            book_name: Some("ulysses".into()),
            student_name: Some("smith".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(title_and_name, ["1000 Ulysses", "100% Ulysses"]);

    let all_three = lib
        .titles(RentListQuery {
            book_name: Some("dune".into()),
            student_name: Some("paul".into()),
            date: Some(june(17)),
            ..Default::default()
        })
        .await;
    assert_eq!(all_three, ["Dune"]);

    let none = lib
        .titles(RentListQuery {
            book_name: Some("dune".into()),
            student_name: Some("paul".into()),
            date: Some(june(18)),
            ..Default::default()
        })
        .await;
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_rent_listing_pages_newest_first() {
    let lib = library().await;

    let page = lib
        .services
        .reports
        .list_rents(&RentListQuery {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 5);
    assert!(page.pagination.has_next);
    let titles: Vec<_> = page.results.iter().map(|r| r.book_title.as_str()).collect();
    assert_eq!(titles, ["1000 Ulysses", "Dune Messiah"]);
    assert_eq!(page.results[0].student_name, "Joan Smith");
    assert_eq!(page.results[0].rented_date, at(19, 12));

    let last = lib
        .services
        .reports
        .list_rents(&RentListQuery {
            limit: Some(2),
            offset: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.results.len(), 1);
    assert!(!last.pagination.has_next);
    assert_eq!(last.results[0].rented_date, at(17, 9));
}

#[tokio::test]
#[ignore]
async fn test_rented_books_by_card() {
    let lib = library().await;

    let (rows, pagination) = lib
        .services
        .reports
        .rented_books(Some(&lib.paul.card_id))
        .await
        .unwrap();
    assert_eq!(pagination.total, 2);
    let mut titles: Vec<_> = rows.iter().map(|r| r.book_title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, ["Dune", "Emma"]);
    assert!(rows.iter().all(|r| r.student_name == "Paul Atreides"));

    let (rows, _) = lib
        .services
        .reports
        .rented_books(Some(&lib.chani.card_id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book_title, "Dune Messiah");

    let (rows, pagination) = lib.services.reports.rented_books(Some("NO-SUCH-CARD")).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(pagination.total, 0);

    let (rows, _) = lib.services.reports.rented_books(None).await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].book_title, "1000 Ulysses");
}

#[tokio::test]
#[ignore]
async fn test_overdue_query() {
    let (repository, services) = setup().await;
    let reader = student(&repository, "Paul", "Atreides").await;
    let dune = book(&repository, "Dune", 5).await;

    let cart_id = rent(&services, &reader, &[&dune]).await;
    sqlx::query("UPDATE carts SET created_at = NOW() - INTERVAL '10 days' WHERE id = $1")
        .bind(cart_id)
        .execute(&repository.pool)
        .await
        .unwrap();
    let recent = student(&repository, "Chani", "Kynes").await;
    rent(&services, &recent, &[&dune]).await;

    let report = services
        .reports
        .overdue_report(Some(&reader.card_id), None, None)
        .await
        .unwrap();
    assert_eq!(report.pagination.total, 1);
    assert_eq!(report.results[0].cart_id, cart_id);
    assert_eq!(report.results[0].days_overdue, 3);

    let report = services.reports.overdue_report(None, None, None).await.unwrap();
    assert_eq!(report.pagination.total, 1);
    assert_eq!(report.results[0].student_card_id, reader.card_id);
}

#[tokio::test]
#[ignore]
async fn test_rent_report_aggregates() {
    let lib = library().await;

    let report = lib.services.reports.rent_report(None, None).await.unwrap();

    // the returned cart still counts as history
    assert_eq!(report.total_rents, 6);
    assert_eq!(report.total_students, 3);

    assert_eq!(report.top_books.len(), 5);
    assert_eq!(report.top_books[0].book_title, "Dune");
    assert_eq!(report.top_books[0].rented_count, 2);
    assert!(report.top_books[1..].iter().all(|b| b.rented_count == 1));

    let names: Vec<_> = report
        .top_overdue
        .iter()
        .map(|s| s.student_name.as_str())
        .collect();
    assert_eq!(names, ["Paul Atreides", "Joan Smith", "Chani Kynes"]);
    assert_eq!(report.top_overdue[0].total_books, 2);
    assert_eq!(report.top_overdue[0].date_rented, at(17, 9));
    assert_eq!(report.top_overdue[1].total_books, 2);
    assert_eq!(report.top_overdue[1].student_card_id, lib.joan.card_id);
    assert_eq!(report.top_overdue[2].total_books, 1);

    let page = lib.services.reports.rent_report(Some(2), Some(1)).await.unwrap();
    assert_eq!(page.top_books.len(), 2);
    assert!(page.top_books.iter().all(|b| b.rented_count == 1));
    assert_eq!(page.top_overdue.len(), 2);
    assert_eq!(page.top_overdue[0].student_name, "Joan Smith");
}
