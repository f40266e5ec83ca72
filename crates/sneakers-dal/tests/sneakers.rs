use futures::TryStreamExt as _;
use sneakers_dal::{
    Error, ListingParams,
    sneaker::{
        CatalogStore as _, CreateSneaker, Sneaker, SneakerFilter, SneakerRepository,
        SneakerRepositoryImpl, SortBy,
    },
    user::{CreateUser, UserRepositoryImpl},
};
use sqlx::Executor;
use tracing_test::traced_test;

const TEST_DATA: &str = r#"
INSERT INTO users (id, name, email, password, created_at)
VALUES (1, 'olivia', 'olivia@example.com', 'x', datetime());

INSERT INTO sneakers (id, name, shoe_designer, publisher, publication_year, type, price, created_at, updated_at, created_by, updated_by)
VALUES (1, 'adidas Superstar', 'Chris Severn', 'adidas', 1969, 'Lifestyle', 1500000, datetime('now', '-3 days'), datetime(), 1, 1);
INSERT INTO sneakers (id, name, shoe_designer, publisher, publication_year, type, price, created_at, updated_at, created_by, updated_by)
VALUES (2, 'Nike Air Force 1', 'Bruce Kilgore', 'Nike', 1982, 'Basketball', 1600000, datetime('now', '-2 days'), datetime(), 1, 1);
INSERT INTO sneakers (id, name, shoe_designer, publisher, publication_year, type, price, created_at, updated_at, created_by, updated_by)
VALUES (3, 'adidas Samba', 'Adi Dassler', 'adidas', 1950, 'lifestyle', 1200000, datetime('now', '-1 days'), datetime(), 1, 1);
INSERT INTO sneakers (id, name, shoe_designer, publisher, publication_year, type, price, created_at, updated_at, created_by, updated_by, deleted_at)
VALUES (4, 'adidas Gazelle', 'Adi Dassler', 'adidas', 1966, 'Lifestyle', 1100000, datetime(), datetime(), 1, 1, datetime());
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    sneakers_dal::MIGRATOR.run(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

fn new_sneaker(name: &str) -> CreateSneaker {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "shoe_designer": "Chris Severn",
        "publisher": "adidas",
        "publication_year": "1969",
        "type": "Lifestyle",
        "cover": "https://res.cloudinary.com/overkillshop/image/upload/ID7493_1.jpg",
        "price": 1020000
    }))
    .unwrap()
}

async fn sorted(repo: &SneakerRepository, sort: Option<SortBy>) -> Vec<Sneaker> {
    let mut params = ListingParams::unbounded();
    if let Some(sort) = sort {
        params = params.with_order(vec![sort.order()]);
    }
    repo.list(&SneakerFilter::default(), params).await.unwrap()
}

fn names(records: &[Sneaker]) -> Vec<&str> {
    records.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
#[traced_test]
async fn test_count_and_filters() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);

    assert_eq!(3, repo.count(&SneakerFilter::default()).await.unwrap());

    let filter = SneakerFilter::default().search("ADIDAS");
    assert_eq!(2, repo.count(&filter).await.unwrap());

    let filter = SneakerFilter::default().sneaker_type("LIFESTYLE");
    assert_eq!(2, repo.count(&filter).await.unwrap());

    let filter = SneakerFilter::default()
        .search("samba")
        .sneaker_type("lifestyle");
    let records = repo.list(&filter, ListingParams::unbounded()).await.unwrap();
    assert_eq!(vec!["adidas Samba"], names(&records));

    let filter = SneakerFilter::default().publisher("nik");
    assert_eq!(1, repo.count(&filter).await.unwrap());

    // wildcard characters are matched literally
    let filter = SneakerFilter::default().search("%");
    assert_eq!(0, repo.count(&filter).await.unwrap());
}

#[tokio::test]
#[traced_test]
async fn test_non_ascii_filters_agree_with_matches() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);

    let mut payload = new_sneaker("Éclair Runner");
    payload.sneaker_type = Some("Ästhetik".to_string());
    payload.publisher = Some("Ünited Feet".to_string());
    let record = repo.create(payload, 1).await.unwrap();

    let filters = [
        (SneakerFilter::default().search("Éclair"), 1),
        (SneakerFilter::default().search("ÉCLAIR RUNNER"), 1),
        (SneakerFilter::default().search("runner"), 1),
        (SneakerFilter::default().search("éclair"), 0),
        (SneakerFilter::default().sneaker_type("Ästhetik"), 1),
        (SneakerFilter::default().sneaker_type("ÄSTHETIK"), 1),
        (SneakerFilter::default().sneaker_type("ästhetik"), 0),
        (SneakerFilter::default().publisher("ünited"), 0),
        (SneakerFilter::default().publisher("Ünited FEET"), 1),
    ];
    for (filter, expected) in filters {
        let count = repo.count(&filter).await.unwrap();
        assert_eq!(expected, count, "{filter:?}");
        assert_eq!(expected == 1, filter.matches(&record), "{filter:?}");
    }
}

#[tokio::test]
async fn test_sorting() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);
    let records = sorted(&repo, None).await;
    assert_eq!(
        vec!["adidas Superstar", "Nike Air Force 1", "adidas Samba"],
        names(&records)
    );

    let records = sorted(&repo, Some(SortBy::PriceAsc)).await;
    let prices: Vec<f64> = records.iter().map(|s| s.price.unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    let records = sorted(&repo, Some(SortBy::LatestPublication)).await;
    assert_eq!(records[0].publication_year, Some(1982));

    let records = sorted(&repo, Some(SortBy::LatestAdded)).await;
    assert_eq!(records[0].name, "adidas Samba");

    let records = sorted(&repo, Some(SortBy::NameAsc)).await;
    assert_eq!(
        vec!["adidas Samba", "adidas Superstar", "Nike Air Force 1"],
        names(&records)
    );
}

#[tokio::test]
async fn test_paging() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);
    let all = SneakerFilter::default();

    let page = repo.fetch(&all, ListingParams::new(0, 2)).await.unwrap();
    assert_eq!(vec![1, 2], page.iter().map(|s| s.id).collect::<Vec<_>>());

    let page = repo.fetch(&all, ListingParams::new(2, 2)).await.unwrap();
    assert_eq!(vec![3], page.iter().map(|s| s.id).collect::<Vec<_>>());

    let page = repo.fetch(&all, ListingParams::new(10, 2)).await.unwrap();
    assert!(page.is_empty());

    let params = ListingParams {
        offset: 1,
        limit: None,
        order: None,
    };
    let page = repo.fetch(&all, params).await.unwrap();
    assert_eq!(2, page.len());
}

#[tokio::test]
async fn test_invalid_order_field() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);
    let params =
        ListingParams::unbounded().with_order(vec![sneakers_dal::Order::Asc("title".into())]);
    let res = repo.list(&SneakerFilter::default(), params).await;
    assert!(matches!(res, Err(Error::InvalidOrderByField(_))));
}

#[tokio::test]
#[traced_test]
async fn test_crud() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);

    let record = repo
        .create(new_sneaker("adidas Superstar Rich Mnisi"), 1)
        .await
        .unwrap();
    assert_eq!(record.publication_year, Some(1969));
    assert_eq!(record.created_by, Some(1));
    assert_eq!(record.sneaker_type.as_deref(), Some("Lifestyle"));

    let fetched = repo.get(record.id).await.unwrap();
    assert_eq!(fetched, record);

    let mut changed = new_sneaker("adidas Superstar Rich Mnisi OT");
    changed.price = Some(999.5);
    changed.cover = None;
    let updated = repo.update(record.id, changed, 1).await.unwrap();
    assert_eq!(updated.name, "adidas Superstar Rich Mnisi OT");
    assert_eq!(updated.price, Some(999.5));
    assert_eq!(updated.cover, None);
    assert_eq!(updated.created_at, record.created_at);

    repo.soft_delete(record.id, 1).await.unwrap();
    assert!(matches!(
        repo.get(record.id).await,
        Err(Error::RecordNotFound(_))
    ));
    assert!(matches!(
        repo.soft_delete(record.id, 1).await,
        Err(Error::RecordNotFound(_))
    ));
    assert!(matches!(
        repo.update(record.id, new_sneaker("Again"), 1).await,
        Err(Error::RecordNotFound(_))
    ));
    assert_eq!(3, repo.count(&SneakerFilter::default()).await.unwrap());
}

#[tokio::test]
async fn test_soft_deleted_hidden() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);

    assert!(matches!(repo.get(4).await, Err(Error::RecordNotFound(_))));
    let records = repo
        .list(
            &SneakerFilter::default().search("gazelle"),
            ListingParams::unbounded(),
        )
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_duplicate_name() {
    let conn = init_db().await;
    let repo = SneakerRepositoryImpl::new(conn);

    let res = repo.create(new_sneaker("ADIDAS SUPERSTAR"), 1).await;
    assert!(matches!(res, Err(Error::DuplicateName(_))));

    // name of soft deleted record is still taken
    let res = repo.create(new_sneaker("adidas Gazelle"), 1).await;
    assert!(matches!(res, Err(Error::DuplicateName(_))));

    let res = repo.update(2, new_sneaker("adidas Samba"), 1).await;
    assert!(matches!(res, Err(Error::DuplicateName(_))));

    // keeping own name is fine
    let res = repo.update(3, new_sneaker("adidas Samba"), 1).await;
    assert!(res.is_ok());
}

#[tokio::test]
async fn test_users() {
    let conn = init_db().await;
    let repo = UserRepositoryImpl::new(conn);

    let user = repo
        .create(CreateUser {
            name: "Tester".to_string(),
            email: "Tester@Example.com".parse().unwrap(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "tester@example.com");

    let checked = repo
        .check_password("tester@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(checked.id, user.id);

    assert!(matches!(
        repo.check_password("tester@example.com", "wrong-password")
            .await,
        Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
        repo.check_password("nobody@example.com", "password123")
            .await,
        Err(Error::InvalidCredentials)
    ));

    let res = repo
        .create(CreateUser {
            name: "Tester".to_string(),
            email: "tester@example.com".parse().unwrap(),
            password: "password123".to_string(),
        })
        .await;
    assert!(matches!(res, Err(Error::DuplicateEmail(_))));
}
