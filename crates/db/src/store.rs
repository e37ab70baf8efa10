use async_trait::async_trait;

use bookstore_kernel::Migration;

use crate::models::{
    Book, BookFilter, BookFlag, CascadeDelete, Category, Order, Payment, Role, SellerVerification,
    Settlement, UpdateCount, User,
};

/// Document store used by every request handler.
///
/// Absent records are reported through `Option` or zero counts, never as
/// errors; errors mean the backend itself failed. Inserts assign a fresh id
/// and ignore any id the caller supplied.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>>;

    async fn insert_category(&self, category: Category) -> anyhow::Result<String>;

    async fn list_books(&self, filter: &BookFilter) -> anyhow::Result<Vec<Book>>;

    async fn get_book(&self, id: &str) -> anyhow::Result<Option<Book>>;

    async fn insert_book(&self, book: Book) -> anyhow::Result<String>;

    /// Set one flag on an existing book; `None` when no book has this id.
    async fn set_book_flag(
        &self,
        id: &str,
        flag: BookFlag,
        value: bool,
    ) -> anyhow::Result<Option<UpdateCount>>;

    /// Returns the number of books removed (0 or 1)
    async fn delete_book(&self, id: &str) -> anyhow::Result<u64>;

    /// Remove a book and every order referencing it in one atomic step
    async fn delete_book_with_orders(&self, id: &str) -> anyhow::Result<CascadeDelete>;

    async fn insert_order(&self, order: Order) -> anyhow::Result<String>;

    async fn list_orders_by_buyer(&self, buyer_email: &str) -> anyhow::Result<Vec<Order>>;

    async fn get_order(&self, id: &str) -> anyhow::Result<Option<Order>>;

    async fn delete_order(&self, id: &str) -> anyhow::Result<u64>;

    /// Record the payment, mark its order paid and its book sold, atomically
    async fn settle_payment(&self, payment: Payment) -> anyhow::Result<Settlement>;

    async fn get_payment(&self, id: &str) -> anyhow::Result<Option<Payment>>;

    /// Insert unless a user with the same email exists; `None` on duplicate
    async fn insert_user_if_absent(&self, user: User) -> anyhow::Result<Option<String>>;

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn list_users(&self, role: Option<Role>) -> anyhow::Result<Vec<User>>;

    /// Mark a user verified together with all books they sell; `None` when absent
    async fn verify_seller(&self, user_id: &str) -> anyhow::Result<Option<SellerVerification>>;

    async fn delete_user(&self, id: &str) -> anyhow::Result<u64>;

    /// Apply schema migrations not yet recorded; returns how many ran
    async fn apply_migrations(&self, _migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        Ok(0)
    }
}
