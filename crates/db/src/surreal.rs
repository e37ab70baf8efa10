//! SurrealDB backend over WebSocket.
//!
//! Record ids are plain strings (`books:<uuid>`); queries project `meta::id(id)`
//! back into the `id` field so records deserialize into the shared models.
//! Multi-record writes run inside one transaction.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use surrealdb::{engine::any::Any, opt::auth::Root, Response, Surreal};

use bookstore_kernel::{settings::DatabaseSettings, Migration};

use crate::{
    models::{
        Book, BookFilter, BookFlag, CascadeDelete, Category, Order, Payment, Role,
        SellerVerification, Settlement, UpdateCount, User,
    },
    new_id,
    store::Store,
};

const ORDER_MISSING: &str = "settlement:order_missing";
const BOOK_MISSING: &str = "settlement:book_missing";

pub struct SurrealStore {
    db: Surreal<Any>,
}

#[derive(Debug, Deserialize)]
struct FlagOutcome {
    found: bool,
    previous: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Counts {
    primary: u64,
    secondary: u64,
}

#[derive(Debug, Deserialize)]
struct VerifyOutcome {
    found: bool,
    was_verified: Option<bool>,
    books: u64,
}

impl SurrealStore {
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let db = surrealdb::engine::any::connect(settings.endpoint.as_str())
            .await
            .with_context(|| format!("failed to connect to SurrealDB at {}", settings.endpoint))?;

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .context("SurrealDB sign-in failed")?;
        }

        db.use_ns(settings.namespace.as_str())
            .use_db(settings.database.as_str())
            .await
            .with_context(|| {
                format!(
                    "failed to select namespace '{}' / database '{}'",
                    settings.namespace, settings.database
                )
            })?;

        tracing::info!(
            target: "bookstore-db",
            endpoint = %settings.endpoint,
            namespace = %settings.namespace,
            database = %settings.database,
            "connected to SurrealDB"
        );

        Ok(Self { db })
    }

    async fn select_where<T: DeserializeOwned>(
        &self,
        table: &'static str,
        condition: &str,
        binds: Vec<(&'static str, serde_json::Value)>,
    ) -> anyhow::Result<Vec<T>> {
        let sql = format!(
            "SELECT *, meta::id(id) AS id FROM type::table($table) {condition} ORDER BY id"
        );
        let mut query = self.db.query(sql).bind(("table", table));
        for bind in binds {
            query = query.bind(bind);
        }
        let mut response = query
            .await
            .with_context(|| format!("select from {table} failed"))?;
        response
            .take(0)
            .with_context(|| format!("failed to decode {table} records"))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: &str,
    ) -> anyhow::Result<Option<T>> {
        let mut response = self
            .db
            .query("SELECT *, meta::id(id) AS id FROM type::thing($table, $id)")
            .bind(("table", table))
            .bind(("id", id.to_owned()))
            .await
            .with_context(|| format!("lookup in {table} failed"))?;
        let mut rows: Vec<T> = response
            .take(0)
            .with_context(|| format!("failed to decode {table} record"))?;
        Ok(rows.pop())
    }

    async fn create<T: Serialize>(&self, table: &'static str, record: &T) -> anyhow::Result<String> {
        let id = new_id();
        self.db
            .query("CREATE type::thing($table, $id) CONTENT $content RETURN NONE")
            .bind(("table", table))
            .bind(("id", id.clone()))
            .bind(("content", content_without_id(record)?))
            .await
            .and_then(Response::check)
            .with_context(|| format!("insert into {table} failed"))?;
        Ok(id)
    }

    async fn delete_by_id(&self, table: &'static str, id: &str) -> anyhow::Result<u64> {
        let mut response = self
            .db
            .query("RETURN array::len((DELETE type::thing($table, $id) RETURN BEFORE))")
            .bind(("table", table))
            .bind(("id", id.to_owned()))
            .await
            .with_context(|| format!("delete from {table} failed"))?;
        let deleted: Option<u64> = response.take(0)?;
        Ok(deleted.unwrap_or(0))
    }
}

/// Serialize a record as document content; the id lives in the record key.
fn content_without_id<T: Serialize>(record: &T) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(record).context("failed to encode record")?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}

/// Decode the final statement result; a `RETURN` inside a transaction leaves only that one.
fn take_last<T: DeserializeOwned>(response: &mut Response) -> anyhow::Result<Option<T>> {
    let last = response
        .num_statements()
        .checked_sub(1)
        .ok_or_else(|| anyhow!("query returned no statements"))?;
    response.take(last).context("failed to decode query result")
}

#[async_trait]
impl Store for SurrealStore {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        self.select_where("categories", "", Vec::new()).await
    }

    async fn insert_category(&self, category: Category) -> anyhow::Result<String> {
        self.create("categories", &category).await
    }

    async fn list_books(&self, filter: &BookFilter) -> anyhow::Result<Vec<Book>> {
        let mut clauses = Vec::new();
        let mut binds: Vec<(&'static str, serde_json::Value)> = Vec::new();

        if let Some(category_id) = &filter.category_id {
            clauses.push("categoryId = $category_id");
            binds.push(("category_id", category_id.clone().into()));
        }
        if let Some(seller_email) = &filter.seller_email {
            clauses.push("sellerEmail = $seller_email");
            binds.push(("seller_email", seller_email.clone().into()));
        }
        // Absent flags count as false, matching the model defaults.
        if let Some(advertised) = filter.advertised {
            clauses.push("(isAdvertised ?? false) = $advertised");
            binds.push(("advertised", advertised.into()));
        }
        if let Some(reported) = filter.reported {
            clauses.push("(isReported ?? false) = $reported");
            binds.push(("reported", reported.into()));
        }
        if let Some(sold) = filter.sold {
            clauses.push("(isSold ?? false) = $sold");
            binds.push(("sold", sold.into()));
        }

        let condition = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        self.select_where("books", &condition, binds).await
    }

    async fn get_book(&self, id: &str) -> anyhow::Result<Option<Book>> {
        self.select_one("books", id).await
    }

    async fn insert_book(&self, book: Book) -> anyhow::Result<String> {
        self.create("books", &book).await
    }

    async fn set_book_flag(
        &self,
        id: &str,
        flag: BookFlag,
        value: bool,
    ) -> anyhow::Result<Option<UpdateCount>> {
        // UPDATE never creates a record, so a missing id stays missing.
        let field = flag.field();
        let sql = format!(
            "BEGIN TRANSACTION;
             LET $before = (SELECT * FROM ONLY type::thing('books', $id));
             UPDATE type::thing('books', $id) SET {field} = $value RETURN NONE;
             RETURN {{ found: $before != NONE, previous: $before.{field} }};
             COMMIT TRANSACTION;"
        );
        let mut response = self
            .db
            .query(sql)
            .bind(("id", id.to_owned()))
            .bind(("value", value))
            .await
            .context("book flag update failed")?;

        let outcome = take_last::<FlagOutcome>(&mut response)?;
        Ok(outcome.filter(|p| p.found).map(|p| UpdateCount {
            matched: 1,
            modified: u64::from(p.previous.unwrap_or(false) != value),
        }))
    }

    async fn delete_book(&self, id: &str) -> anyhow::Result<u64> {
        self.delete_by_id("books", id).await
    }

    async fn delete_book_with_orders(&self, id: &str) -> anyhow::Result<CascadeDelete> {
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 LET $books = (DELETE type::thing('books', $id) RETURN BEFORE);
                 LET $orders = (DELETE orders WHERE bookId = $id RETURN BEFORE);
                 RETURN { primary: array::len($books), secondary: array::len($orders) };
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_owned()))
            .await
            .context("cascading book delete failed")?;

        let counts = take_last::<Counts>(&mut response)?
            .ok_or_else(|| anyhow!("cascading delete returned no counts"))?;
        Ok(CascadeDelete {
            books_deleted: counts.primary,
            orders_deleted: counts.secondary,
        })
    }

    async fn insert_order(&self, order: Order) -> anyhow::Result<String> {
        self.create("orders", &order).await
    }

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> anyhow::Result<Vec<Order>> {
        self.select_where(
            "orders",
            "WHERE buyerEmail = $buyer_email",
            vec![("buyer_email", buyer_email.to_owned().into())],
        )
        .await
    }

    async fn get_order(&self, id: &str) -> anyhow::Result<Option<Order>> {
        self.select_one("orders", id).await
    }

    async fn delete_order(&self, id: &str) -> anyhow::Result<u64> {
        self.delete_by_id("orders", id).await
    }

    async fn settle_payment(&self, payment: Payment) -> anyhow::Result<Settlement> {
        let payment_id = new_id();
        let sql = format!(
            "BEGIN TRANSACTION;
             IF (SELECT * FROM ONLY type::thing('orders', $order_id)) = NONE {{ THROW '{ORDER_MISSING}' }};
             IF (SELECT * FROM ONLY type::thing('books', $book_id)) = NONE {{ THROW '{BOOK_MISSING}' }};
             CREATE type::thing('payments', $payment_id) CONTENT $content RETURN NONE;
             UPDATE type::thing('orders', $order_id) SET paid = true, transactionId = $transaction_id RETURN NONE;
             UPDATE type::thing('books', $book_id) SET isSold = true RETURN NONE;
             COMMIT TRANSACTION;"
        );

        let mut response = self
            .db
            .query(sql)
            .bind(("order_id", payment.ordered_id.clone()))
            .bind(("book_id", payment.book_id.clone()))
            .bind(("payment_id", payment_id.clone()))
            .bind(("transaction_id", payment.transaction_id.clone()))
            .bind(("content", content_without_id(&payment)?))
            .await
            .context("payment settlement failed")?;

        let errors = response.take_errors();
        if errors.is_empty() {
            return Ok(Settlement::Settled { payment_id });
        }

        let messages: Vec<String> = errors.values().map(|e| e.to_string()).collect();
        if messages.iter().any(|m| m.contains(ORDER_MISSING)) {
            return Ok(Settlement::OrderMissing);
        }
        if messages.iter().any(|m| m.contains(BOOK_MISSING)) {
            return Ok(Settlement::BookMissing);
        }
        Err(anyhow!("payment settlement rolled back: {}", messages.join("; ")))
    }

    async fn get_payment(&self, id: &str) -> anyhow::Result<Option<Payment>> {
        self.select_one("payments", id).await
    }

    async fn insert_user_if_absent(&self, user: User) -> anyhow::Result<Option<String>> {
        // The unique index on userEmail rejects a racing duplicate.
        let id = new_id();
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 LET $existing = (SELECT VALUE id FROM users WHERE userEmail = $email LIMIT 1);
                 IF array::len($existing) = 0 {
                     CREATE type::thing('users', $id) CONTENT $content RETURN NONE;
                 };
                 RETURN array::len($existing) = 0;
                 COMMIT TRANSACTION;",
            )
            .bind(("email", user.user_email.clone()))
            .bind(("id", id.clone()))
            .bind(("content", content_without_id(&user)?))
            .await
            .context("user registration failed")?;

        let created = take_last::<bool>(&mut response)?;
        Ok(created.unwrap_or(false).then_some(id))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let mut users: Vec<User> = self
            .select_where(
                "users",
                "WHERE userEmail = $email",
                vec![("email", email.to_owned().into())],
            )
            .await?;
        Ok(users.pop())
    }

    async fn list_users(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        match role {
            Some(role) => {
                self.select_where(
                    "users",
                    "WHERE role = $role",
                    vec![("role", role.as_str().into())],
                )
                .await
            }
            None => self.select_where("users", "", Vec::new()).await,
        }
    }

    async fn verify_seller(&self, user_id: &str) -> anyhow::Result<Option<SellerVerification>> {
        let mut response = self
            .db
            .query(
                "BEGIN TRANSACTION;
                 LET $user = (SELECT * FROM ONLY type::thing('users', $id));
                 UPDATE type::thing('users', $id) SET isVerified = true RETURN NONE;
                 LET $books = (UPDATE books SET isVerified = true
                     WHERE $user != NONE
                         AND sellerEmail = $user.userEmail
                         AND (isVerified ?? false) = false
                     RETURN BEFORE);
                 RETURN { found: $user != NONE, was_verified: $user.isVerified, books: array::len($books) };
                 COMMIT TRANSACTION;",
            )
            .bind(("id", user_id.to_owned()))
            .await
            .context("seller verification failed")?;

        let outcome = take_last::<VerifyOutcome>(&mut response)?;
        Ok(outcome.filter(|p| p.found).map(|p| SellerVerification {
            user: UpdateCount {
                matched: 1,
                modified: u64::from(!p.was_verified.unwrap_or(false)),
            },
            books_verified: p.books,
        }))
    }

    async fn delete_user(&self, id: &str) -> anyhow::Result<u64> {
        self.delete_by_id("users", id).await
    }

    async fn apply_migrations(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        let mut response = self
            .db
            .query("SELECT VALUE meta::id(id) FROM migrations")
            .await
            .context("failed to read applied migrations")?;
        let applied: Vec<String> = response.take(0)?;

        let mut ran = 0;
        for (module, migration) in migrations {
            let key = migration.key(module);
            if applied.contains(&key) {
                tracing::debug!(module = %module, migration = migration.id, "migration already applied");
                continue;
            }

            tracing::info!(module = %module, migration = migration.id, "applying migration");
            let sql = format!(
                "BEGIN TRANSACTION;
                 {}
                 CREATE type::thing('migrations', $key) SET module = $module, applied_at = time::now() RETURN NONE;
                 COMMIT TRANSACTION;",
                migration.up
            );
            self.db
                .query(sql)
                .bind(("key", key.clone()))
                .bind(("module", module.clone()))
                .await
                .and_then(Response::check)
                .with_context(|| format!("migration {key} failed"))?;
            ran += 1;
        }

        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_kernel::settings::DatabaseBackend;
    use serde_json::json;

    async fn store() -> SurrealStore {
        SurrealStore::connect(&DatabaseSettings {
            backend: DatabaseBackend::Surreal,
            endpoint: "mem://".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
    }

    fn book(seller: &str) -> Book {
        serde_json::from_value(json!({
            "title": "Middlemarch",
            "categoryId": "classics",
            "sellerEmail": seller,
            "price": 7.25,
            "condition": "worn"
        }))
        .unwrap()
    }

    fn order(book_id: &str, buyer: &str) -> Order {
        serde_json::from_value(json!({ "bookId": book_id, "buyerEmail": buyer })).unwrap()
    }

    fn user(email: &str, role: Role) -> User {
        User {
            id: String::new(),
            user_email: email.to_string(),
            role,
            is_verified: false,
            extra: Default::default(),
        }
    }

    fn payment(order_id: &str, book_id: &str) -> Payment {
        Payment {
            id: String::new(),
            ordered_id: order_id.to_string(),
            book_id: book_id.to_string(),
            transaction_id: "pi_surreal".to_string(),
            amount: 7.25,
            extra: Default::default(),
        }
    }

    fn users_migrations() -> Vec<(String, Migration)> {
        vec![(
            "users".to_string(),
            Migration {
                id: "001_init",
                up: "DEFINE TABLE users SCHEMALESS;
                     DEFINE INDEX users_email_unique ON users FIELDS userEmail UNIQUE;",
            },
        )]
    }

    #[tokio::test]
    async fn inserted_book_reads_back_with_string_id_and_extra_fields() {
        let store = store().await;
        let id = store.insert_book(book("s@example.com")).await.unwrap();

        let stored = store.get_book(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.price, 7.25);
        assert!(!stored.is_sold);
        assert_eq!(stored.extra["condition"], "worn");

        assert!(store.get_book("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn categories_list_in_insertion_order() {
        let store = store().await;
        for name in ["Poetry", "Drama", "Essays"] {
            store
                .insert_category(Category {
                    id: String::new(),
                    name: name.to_string(),
                    extra: Default::default(),
                })
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Poetry", "Drama", "Essays"]);
    }

    #[tokio::test]
    async fn flag_update_reports_counts_and_never_creates() {
        let store = store().await;
        let id = store.insert_book(book("s@example.com")).await.unwrap();

        let first = store
            .set_book_flag(&id, BookFlag::Advertised, true)
            .await
            .unwrap();
        assert_eq!(first, Some(UpdateCount { matched: 1, modified: 1 }));

        let again = store
            .set_book_flag(&id, BookFlag::Advertised, true)
            .await
            .unwrap();
        assert_eq!(again, Some(UpdateCount { matched: 1, modified: 0 }));

        let missing = store
            .set_book_flag("ghost", BookFlag::Reported, true)
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(store.get_book("ghost").await.unwrap().is_none());

        let advertised = store
            .list_books(&BookFilter {
                advertised: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(advertised.len(), 1);
    }

    #[tokio::test]
    async fn cascade_removes_every_order_for_the_book() {
        let store = store().await;
        let doomed = store.insert_book(book("s@example.com")).await.unwrap();
        let kept = store.insert_book(book("s@example.com")).await.unwrap();
        for buyer in ["a@example.com", "b@example.com", "c@example.com"] {
            store.insert_order(order(&doomed, buyer)).await.unwrap();
        }
        let survivor = store.insert_order(order(&kept, "a@example.com")).await.unwrap();

        let outcome = store.delete_book_with_orders(&doomed).await.unwrap();
        assert_eq!(
            outcome,
            CascadeDelete {
                books_deleted: 1,
                orders_deleted: 3
            }
        );

        assert!(store.get_book(&doomed).await.unwrap().is_none());
        assert!(store.get_order(&survivor).await.unwrap().is_some());
        assert_eq!(
            store.list_orders_by_buyer("a@example.com").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_by_id_counts_removed_records() {
        let store = store().await;
        let id = store.insert_book(book("s@example.com")).await.unwrap();

        assert_eq!(store.delete_book(&id).await.unwrap(), 1);
        assert_eq!(store.delete_book(&id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn settlement_marks_order_paid_and_book_sold() {
        let store = store().await;
        let book_id = store.insert_book(book("s@example.com")).await.unwrap();
        let order_id = store
            .insert_order(order(&book_id, "buyer@example.com"))
            .await
            .unwrap();

        let outcome = store
            .settle_payment(payment(&order_id, &book_id))
            .await
            .unwrap();
        let Settlement::Settled { payment_id } = outcome else {
            panic!("expected settlement, got {outcome:?}");
        };

        let order = store.get_order(&order_id).await.unwrap().unwrap();
        assert!(order.paid);
        assert_eq!(order.transaction_id.as_deref(), Some("pi_surreal"));
        assert!(store.get_book(&book_id).await.unwrap().unwrap().is_sold);

        let recorded = store.get_payment(&payment_id).await.unwrap().unwrap();
        assert_eq!(recorded.ordered_id, order_id);
    }

    #[tokio::test]
    async fn settlement_with_missing_records_writes_nothing() {
        let store = store().await;
        let book_id = store.insert_book(book("s@example.com")).await.unwrap();
        let order_id = store
            .insert_order(order("elsewhere", "buyer@example.com"))
            .await
            .unwrap();

        let no_order = store
            .settle_payment(payment("ghost-order", &book_id))
            .await
            .unwrap();
        assert_eq!(no_order, Settlement::OrderMissing);
        assert!(!store.get_book(&book_id).await.unwrap().unwrap().is_sold);

        let no_book = store
            .settle_payment(payment(&order_id, "ghost-book"))
            .await
            .unwrap();
        assert_eq!(no_book, Settlement::BookMissing);
        assert!(!store.get_order(&order_id).await.unwrap().unwrap().paid);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_one_user() {
        let store = store().await;
        store.apply_migrations(&users_migrations()).await.unwrap();

        let first = store
            .insert_user_if_absent(user("dup@example.com", Role::Buyer))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .insert_user_if_absent(user("dup@example.com", Role::Admin))
            .await
            .unwrap();
        assert!(second.is_none());

        let users = store.list_users(None).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Buyer);
        assert_eq!(
            store
                .find_user_by_email("dup@example.com")
                .await
                .unwrap()
                .map(|u| u.id),
            first
        );
        assert!(store.list_users(Some(Role::Admin)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seller_verification_covers_their_books_only() {
        let store = store().await;
        let seller_id = store
            .insert_user_if_absent(user("seller@example.com", Role::Seller))
            .await
            .unwrap()
            .unwrap();
        store.insert_book(book("seller@example.com")).await.unwrap();
        store.insert_book(book("seller@example.com")).await.unwrap();
        let other = store.insert_book(book("other@example.com")).await.unwrap();

        let outcome = store.verify_seller(&seller_id).await.unwrap().unwrap();
        assert_eq!(outcome.user, UpdateCount { matched: 1, modified: 1 });
        assert_eq!(outcome.books_verified, 2);

        let seller = store
            .find_user_by_email("seller@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(seller.is_verified);
        assert!(!store.get_book(&other).await.unwrap().unwrap().is_verified);

        let repeat = store.verify_seller(&seller_id).await.unwrap().unwrap();
        assert_eq!(repeat.user.modified, 0);
        assert_eq!(repeat.books_verified, 0);

        assert!(store.verify_seller("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migrations_run_once() {
        let store = store().await;
        let migrations = users_migrations();

        assert_eq!(store.apply_migrations(&migrations).await.unwrap(), 1);
        assert_eq!(store.apply_migrations(&migrations).await.unwrap(), 0);
    }
}
