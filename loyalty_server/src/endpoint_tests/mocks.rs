use loyalty_engine::{
    db_types::{Balance, Order, OrderNumber, UserId, Withdrawal},
    AccountManagement,
    LedgerError,
};
use mockall::mock;

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_balance(&self, user_id: &UserId) -> Result<Balance, LedgerError>;
        async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError>;
        async fn fetch_withdrawals_for_user(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;
    }
}
