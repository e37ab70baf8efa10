//! In-process backend. Every multi-record operation holds one write guard
//! for its whole duration, which makes it atomic with respect to other
//! requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    models::{
        Book, BookFilter, BookFlag, CascadeDelete, Category, Order, Payment, Role,
        SellerVerification, Settlement, UpdateCount, User,
    },
    new_id,
    store::Store,
};

// Ids are UUIDv7, so key order is insertion order.
#[derive(Default)]
struct Collections {
    categories: BTreeMap<String, Category>,
    books: BTreeMap<String, Book>,
    orders: BTreeMap<String, Order>,
    payments: BTreeMap<String, Payment>,
    users: BTreeMap<String, User>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given category names
    pub async fn with_categories<I, S>(names: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store
                .insert_category(Category {
                    id: String::new(),
                    name: name.into(),
                    extra: Default::default(),
                })
                .await?;
        }
        Ok(store)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        Ok(self.inner.read().await.categories.values().cloned().collect())
    }

    async fn insert_category(&self, mut category: Category) -> anyhow::Result<String> {
        let id = new_id();
        category.id = id.clone();
        self.inner.write().await.categories.insert(id.clone(), category);
        Ok(id)
    }

    async fn list_books(&self, filter: &BookFilter) -> anyhow::Result<Vec<Book>> {
        Ok(self
            .inner
            .read()
            .await
            .books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect())
    }

    async fn get_book(&self, id: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.inner.read().await.books.get(id).cloned())
    }

    async fn insert_book(&self, mut book: Book) -> anyhow::Result<String> {
        let id = new_id();
        book.id = id.clone();
        self.inner.write().await.books.insert(id.clone(), book);
        Ok(id)
    }

    async fn set_book_flag(
        &self,
        id: &str,
        flag: BookFlag,
        value: bool,
    ) -> anyhow::Result<Option<UpdateCount>> {
        let mut guard = self.inner.write().await;
        let Some(book) = guard.books.get_mut(id) else {
            return Ok(None);
        };

        let modified = flag.get(book) != value;
        flag.set(book, value);

        Ok(Some(UpdateCount {
            matched: 1,
            modified: u64::from(modified),
        }))
    }

    async fn delete_book(&self, id: &str) -> anyhow::Result<u64> {
        Ok(u64::from(self.inner.write().await.books.remove(id).is_some()))
    }

    async fn delete_book_with_orders(&self, id: &str) -> anyhow::Result<CascadeDelete> {
        let mut guard = self.inner.write().await;
        let books_deleted = u64::from(guard.books.remove(id).is_some());

        let before = guard.orders.len();
        guard.orders.retain(|_, order| order.book_id != id);
        let orders_deleted = (before - guard.orders.len()) as u64;

        Ok(CascadeDelete {
            books_deleted,
            orders_deleted,
        })
    }

    async fn insert_order(&self, mut order: Order) -> anyhow::Result<String> {
        let id = new_id();
        order.id = id.clone();
        self.inner.write().await.orders.insert(id.clone(), order);
        Ok(id)
    }

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> anyhow::Result<Vec<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .filter(|order| order.buyer_email == buyer_email)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: &str) -> anyhow::Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(id).cloned())
    }

    async fn delete_order(&self, id: &str) -> anyhow::Result<u64> {
        Ok(u64::from(self.inner.write().await.orders.remove(id).is_some()))
    }

    async fn settle_payment(&self, mut payment: Payment) -> anyhow::Result<Settlement> {
        let mut guard = self.inner.write().await;

        if !guard.orders.contains_key(&payment.ordered_id) {
            return Ok(Settlement::OrderMissing);
        }
        if !guard.books.contains_key(&payment.book_id) {
            return Ok(Settlement::BookMissing);
        }

        let payment_id = new_id();
        payment.id = payment_id.clone();

        if let Some(order) = guard.orders.get_mut(&payment.ordered_id) {
            order.paid = true;
            order.transaction_id = Some(payment.transaction_id.clone());
        }
        if let Some(book) = guard.books.get_mut(&payment.book_id) {
            book.is_sold = true;
        }
        guard.payments.insert(payment_id.clone(), payment);

        Ok(Settlement::Settled { payment_id })
    }

    async fn get_payment(&self, id: &str) -> anyhow::Result<Option<Payment>> {
        Ok(self.inner.read().await.payments.get(id).cloned())
    }

    async fn insert_user_if_absent(&self, mut user: User) -> anyhow::Result<Option<String>> {
        let mut guard = self.inner.write().await;
        if guard
            .users
            .values()
            .any(|existing| existing.user_email == user.user_email)
        {
            return Ok(None);
        }

        let id = new_id();
        user.id = id.clone();
        guard.users.insert(id.clone(), user);
        Ok(Some(id))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.user_email == email)
            .cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .filter(|user| role.map_or(true, |r| user.role == r))
            .cloned()
            .collect())
    }

    async fn verify_seller(&self, user_id: &str) -> anyhow::Result<Option<SellerVerification>> {
        let mut guard = self.inner.write().await;
        let Some(user) = guard.users.get_mut(user_id) else {
            return Ok(None);
        };

        let modified = u64::from(!user.is_verified);
        user.is_verified = true;
        let email = user.user_email.clone();

        let mut books_verified = 0;
        for book in guard.books.values_mut().filter(|b| b.seller_email == email) {
            if !book.is_verified {
                book.is_verified = true;
                books_verified += 1;
            }
        }

        Ok(Some(SellerVerification {
            user: UpdateCount {
                matched: 1,
                modified,
            },
            books_verified,
        }))
    }

    async fn delete_user(&self, id: &str) -> anyhow::Result<u64> {
        Ok(u64::from(self.inner.write().await.users.remove(id).is_some()))
    }
}
