//! Order lifecycle shared by the admin API, the seller API and the Telegram
//! bot. Every status mutation in the system goes through [`OrderStatus`] so
//! the transition graph is enforced in exactly one place.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Legal successor statuses. Cancellation is only reachable while the
    /// order has not left the warehouse (pending/confirmed).
    pub fn next(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(self, to: OrderStatus) -> bool {
        self.next().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_empty()
    }
}

/// Check a stored status string against the transition graph.
///
/// Rows written before the validator existed can hold arbitrary text; those
/// are allowed to move to any known status so an operator can repair them.
pub fn transition_allowed(from: &str, to: OrderStatus) -> bool {
    match OrderStatus::parse(from) {
        Some(from) => from.can_transition(to),
        None => true,
    }
}

/// Customer-facing status label (Uzbek) with the fixed emoji per status.
/// Unrecognized values fall back to "noma'lum" silently.
pub fn label_uz(status: &str) -> &'static str {
    match status {
        "pending" => "⏳ Kutilmoqda",
        "confirmed" => "✅ Tasdiqlandi",
        "processing" => "📦 Tayyorlanmoqda",
        "shipped" => "🚚 Yo'lda",
        "delivered" => "🏠 Yetkazildi",
        "completed" => "🎉 Yakunlandi",
        "cancelled" => "❌ Bekor qilindi",
        _ => "Noma'lum",
    }
}
