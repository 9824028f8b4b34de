use teloxide::Bot;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::models::Order;
use crate::status::label_uz;

/// Best-effort Telegram notifications sent from the API process.
///
/// Sends are spawned and never awaited by the request path; a failed
/// notification is logged and dropped, it cannot fail the order operation.
#[derive(Clone)]
pub struct Notifier {
    bot: Option<Bot>,
    admin_chat: Option<ChatId>,
    bot_username: Option<String>,
}

impl Notifier {
    pub fn from_env() -> Self {
        let bot = std::env::var("TELOXIDE_TOKEN").ok().map(Bot::new);
        if bot.is_none() {
            tracing::warn!("TELOXIDE_TOKEN not set, Telegram notifications disabled");
        }
        let admin_chat = std::env::var("ADMIN_CHAT_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .map(ChatId);
        let bot_username = std::env::var("BOT_USERNAME").ok();
        Self {
            bot,
            admin_chat,
            bot_username,
        }
    }

    /// A notifier that drops everything, for tests.
    pub fn disabled() -> Self {
        Self {
            bot: None,
            admin_chat: None,
            bot_username: None,
        }
    }

    pub fn order_created(&self, order: &Order, product_name: &str, buyer_telegram: Option<i64>) {
        if let Some(chat) = self.admin_chat {
            let text = format!(
                "🆕 <b>Yangi buyurtma!</b>\n\
                 📦 {}\n\
                 🔢 Soni: {}\n\
                 💰 Summa: {} so'm\n\
                 👤 {} — {}\n\
                 📍 {}\n\n\
                 ID: <code>{}</code>",
                product_name,
                order.quantity,
                format_sum(order.total_amount),
                order.customer_name,
                order.customer_phone,
                order.customer_address,
                order.id,
            );
            self.send(chat, text);
        }

        if let Some(telegram_id) = buyer_telegram {
            let mut text = format!(
                "✅ <b>Buyurtmangiz qabul qilindi!</b>\n\
                 📦 {}\n\
                 Holat: {}",
                product_name,
                label_uz(&order.status),
            );
            if let Some(link) = self.track_link(order) {
                text.push_str(&format!("\n\nKuzatish: {link}"));
            }
            self.send(ChatId(telegram_id), text);
        }
    }

    pub fn order_status_changed(
        &self,
        order: &Order,
        product_name: &str,
        buyer_telegram: Option<i64>,
    ) {
        let Some(telegram_id) = buyer_telegram else {
            return;
        };
        let text = format!(
            "📣 <b>Buyurtma holati yangilandi</b>\n\
             📦 {}\n\
             Yangi holat: {}\n\
             ID: <code>{}</code>",
            product_name,
            label_uz(&order.status),
            order.id,
        );
        self.send(ChatId(telegram_id), text);
    }

    fn track_link(&self, order: &Order) -> Option<String> {
        self.bot_username
            .as_ref()
            .map(|name| format!("https://t.me/{}?start=order_{}", name, order.id))
    }

    fn send(&self, chat: ChatId, text: String) {
        let Some(bot) = self.bot.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = bot
                .send_message(chat, text)
                .parse_mode(ParseMode::Html)
                .await
            {
                tracing::warn!(error = %err, chat = chat.0, "telegram notification failed");
            }
        });
    }
}

/// Render an UZS amount with thousands separators, e.g. 1250000 -> "1 250 000".
pub fn format_sum(amount: i64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && ch.is_ascii_digit() && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}
