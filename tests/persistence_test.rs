#![cfg(feature = "storage-rocksdb")]

use hirehub::config::StorageUrl;
use hirehub::domain::chat::{Chat, Message};
use hirehub::domain::payment::{
    Amount, Currency, Payment, PaymentProvider, PaymentStatus, TransactionRef,
};
use hirehub::infrastructure::open_stores;
use rust_decimal_macros::dec;
use tempfile::tempdir;
use uuid::Uuid;

#[tokio::test]
async fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let url = StorageUrl::RocksDb(dir.path().join("test_db"));

    let job = Uuid::new_v4();
    let payment = Payment::pending(
        job,
        Uuid::new_v4(),
        Amount::new(dec!(150.00)).unwrap(),
        Currency::default(),
        PaymentProvider::Chapa,
        TransactionRef::for_job(job),
    );
    let chat = Chat::new(job, payment.employer_id, Uuid::new_v4());

    // 1. First run: record a pending payment and a chat
    {
        let (payments, chats) = open_stores(&url).unwrap();
        payments.create(payment.clone()).await.unwrap();
        payments
            .update_status(payment.id, PaymentStatus::Success, chrono::Utc::now())
            .await
            .unwrap();
        chats.create_chat(chat.clone()).await.unwrap();
        let msg = Message::new(chat.id, chat.candidate_id, Some("hi".into()), None).unwrap();
        chats.create_message(msg).await.unwrap();
    }

    // 2. Second run: everything is recovered from disk
    let (payments, chats) = open_stores(&url).unwrap();
    let recovered = payments
        .find_by_transaction_ref(payment.transaction_ref.as_str())
        .await
        .unwrap()
        .expect("payment should survive a reopen");
    assert_eq!(recovered.id, payment.id);
    assert_eq!(recovered.status, PaymentStatus::Success);
    assert_eq!(recovered.amount.to_string(), "150.00");

    assert_eq!(chats.get_chat(chat.id).await.unwrap().unwrap(), chat);
    assert_eq!(chats.messages(chat.id).await.unwrap().len(), 1);

    // The reference index survives too.
    let mut clash = payment.clone();
    clash.id = Uuid::new_v4();
    assert!(payments.create(clash).await.is_err());
}
