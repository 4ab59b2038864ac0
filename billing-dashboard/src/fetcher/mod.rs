use billing_client::{ApiError, CustomerId, DailyReadings, MonthKey, MonthReadingProvider};
use futures::future::join_all;
use time::Date;

/// Previous, current and next calendar month around `today`.
pub fn prefetch_window(today: Date) -> [MonthKey; 3] {
    let current = MonthKey::from_date(today);
    [current.previous(), current, current.next()]
}

/// Fetch several months concurrently and wait until every request settled.
pub async fn settle_all<P>(
    provider: &P,
    customer: &CustomerId,
    months: &[MonthKey],
) -> Vec<(MonthKey, Result<DailyReadings, ApiError>)>
where
    P: MonthReadingProvider + ?Sized,
{
    let requests = months.iter().map(|&month| async move {
        let result = provider.fetch_month(customer, month).await;
        (month, result)
    });
    join_all(requests).await
}
