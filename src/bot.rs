//! Companion Telegram bot. Runs as its own process (`src/bin/bot.rs`)
//! against the same database as the HTTP API.
//!
//! Buyers track their orders here; admins confirm and advance them with
//! inline keyboards. Status changes go through the same
//! [`order_service::transition_order`] path as the HTTP endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;
use uuid::Uuid;

use crate::{
    entity::{
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::{
            ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
        },
    },
    error::AppError,
    notify::format_sum,
    services::order_service,
    state::AppState,
    status::{OrderStatus, label_uz},
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    #[command(description = "botni ishga tushirish")]
    Start(String),
    #[command(description = "yordam")]
    Help,
    #[command(description = "mening buyurtmalarim")]
    Buyurtmalar,
    #[command(description = "buyurtmani kuzatish")]
    Track(String),
    #[command(description = "yangi buyurtmalar (admin)")]
    Yangi,
    #[command(description = "statistika (admin)")]
    Stats,
}

pub async fn run(state: AppState) -> anyhow::Result<()> {
    let token = std::env::var("TELOXIDE_TOKEN").context("TELOXIDE_TOKEN is not set")?;
    let bot = Bot::new(token);

    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(error = %err, "failed to publish command menu");
    }

    tracing::info!("starting telegram bot");

    let state = Arc::new(state);
    let handler = teloxide::dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint({
                    let state = state.clone();
                    move |bot: Bot, msg: Message, cmd: Command| {
                        let state = state.clone();
                        handle_command(state, bot, msg, cmd)
                    }
                }),
        )
        .branch(Update::filter_callback_query().endpoint({
            let state = state.clone();
            move |bot: Bot, query: CallbackQuery| {
                let state = state.clone();
                handle_callback(state, bot, query)
            }
        }));

    Dispatcher::builder(bot, handler).build().dispatch().await;
    Ok(())
}

async fn handle_command(
    state: Arc<AppState>,
    bot: Bot,
    msg: Message,
    cmd: Command,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let user = match ensure_user(&state, &msg).await {
        Ok(user) => user,
        Err(err) => {
            tracing::error!(error = %err, chat = chat_id.0, "user lookup failed");
            reply(&bot, chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko'ring.").await?;
            return Ok(());
        }
    };

    match cmd {
        Command::Start(payload) => {
            // Deep links from order notifications arrive as "/start order_<id>".
            let payload = payload.trim();
            if let Some(raw) = payload.strip_prefix("order_") {
                if let Ok(id) = Uuid::parse_str(raw) {
                    send_order_card(&state, &bot, chat_id, id).await?;
                    return Ok(());
                }
            }
            let text = format!(
                "Assalomu alaykum, {}! 👋\n\
                 Bozor botiga xush kelibsiz.\n\n{}",
                user.full_name,
                help_text(user.is_admin),
            );
            reply(&bot, chat_id, text).await?;
        }
        Command::Help => {
            reply(&bot, chat_id, help_text(user.is_admin)).await?;
        }
        Command::Buyurtmalar => match my_orders_text(&state, &user).await {
            Ok(text) => reply(&bot, chat_id, text).await?,
            Err(err) => {
                tracing::error!(error = %err, "order list failed");
                reply(&bot, chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko'ring.").await?;
            }
        },
        Command::Track(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => send_order_card(&state, &bot, chat_id, id).await?,
            Err(_) => {
                reply(&bot, chat_id, "Foydalanish: /track &lt;buyurtma id&gt;").await?;
            }
        },
        Command::Yangi | Command::Stats if !user.is_admin => {
            reply(&bot, chat_id, "Bu buyruq faqat adminlar uchun.").await?;
        }
        Command::Yangi => {
            if let Err(err) = send_open_orders(&state, &bot, chat_id).await {
                tracing::error!(error = %err, "open order list failed");
                reply(&bot, chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko'ring.").await?;
            }
        }
        Command::Stats => match stats_text(&state).await {
            Ok(text) => reply(&bot, chat_id, text).await?,
            Err(err) => {
                tracing::error!(error = %err, "stats failed");
                reply(&bot, chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko'ring.").await?;
            }
        },
    }

    Ok(())
}

async fn handle_callback(
    state: Arc<AppState>,
    bot: Bot,
    query: CallbackQuery,
) -> ResponseResult<()> {
    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some((order_id, to)) = parse_status_callback(data) else {
        bot.answer_callback_query(query.id).await?;
        return Ok(());
    };

    let admin = match admin_by_telegram(&state, query.from.id.0 as i64).await {
        Ok(Some(admin)) => admin,
        Ok(None) => {
            bot.answer_callback_query(query.id)
                .text("Ruxsat yo'q")
                .await?;
            return Ok(());
        }
        Err(err) => {
            tracing::error!(error = %err, "admin lookup failed");
            bot.answer_callback_query(query.id).text("Xatolik").await?;
            return Ok(());
        }
    };

    match order_service::transition_order(&state, Some(admin.id), None, order_id, to).await {
        Ok(_) => {
            bot.answer_callback_query(query.id).await?;
        }
        Err(AppError::BadRequest(_)) => {
            bot.answer_callback_query(query.id)
                .text("Bu holatga o'tkazib bo'lmaydi")
                .await?;
        }
        Err(AppError::NotFound) => {
            bot.answer_callback_query(query.id)
                .text("Buyurtma topilmadi")
                .await?;
            return Ok(());
        }
        Err(err) => {
            tracing::error!(error = %err, order_id = %order_id, "transition failed");
            bot.answer_callback_query(query.id).text("Xatolik").await?;
            return Ok(());
        }
    }

    // Replace the card with the current state, whatever the outcome was.
    if let Some(msg) = query.message.as_ref() {
        match load_card(&state, order_id).await {
            Ok(Some((order, product_name))) => {
                let mut edit = bot
                    .edit_message_text(msg.chat().id, msg.id(), order_card(&order, &product_name))
                    .parse_mode(ParseMode::Html);
                if let Some(keyboard) = status_keyboard(&order) {
                    edit = edit.reply_markup(keyboard);
                }
                edit.await?;
            }
            Ok(None) => {}
            Err(err) => tracing::error!(error = %err, order_id = %order_id, "card reload failed"),
        }
    }

    Ok(())
}

/// Every chat maps to a users row keyed by `telegram_id`; first contact
/// creates it. Accounts created here have no email or password until the
/// person registers through the site.
async fn ensure_user(state: &AppState, msg: &Message) -> anyhow::Result<UserModel> {
    let telegram_id = msg.chat.id.0;
    if let Some(user) = Users::find()
        .filter(UserCol::TelegramId.eq(telegram_id))
        .one(&state.orm)
        .await?
    {
        return Ok(user);
    }

    let full_name = match (msg.chat.first_name(), msg.chat.last_name()) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.to_string(),
        _ => "Telegram foydalanuvchisi".to_string(),
    };

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(None),
        password_hash: Set(None),
        full_name: Set(full_name),
        phone: Set(None),
        address: Set(None),
        telegram_id: Set(Some(telegram_id)),
        is_admin: Set(false),
        is_seller: Set(false),
        is_verified_seller: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user)
}

async fn admin_by_telegram(state: &AppState, telegram_id: i64) -> anyhow::Result<Option<UserModel>> {
    let user = Users::find()
        .filter(UserCol::TelegramId.eq(telegram_id))
        .one(&state.orm)
        .await?;
    Ok(user.filter(|u| u.is_admin))
}

fn help_text(admin: bool) -> String {
    let mut text = String::from("<b>Bozor bot</b>\n\n");
    text.push_str("/start - botni ishga tushirish\n");
    text.push_str("/buyurtmalar - mening buyurtmalarim\n");
    text.push_str("/track &lt;id&gt; - buyurtmani kuzatish\n");
    text.push_str("/help - yordam\n");
    if admin {
        text.push_str("\n<b>Admin buyruqlari:</b>\n");
        text.push_str("/yangi - yangi buyurtmalar\n");
        text.push_str("/stats - statistika\n");
    }
    text
}

async fn my_orders_text(state: &AppState, user: &UserModel) -> anyhow::Result<String> {
    let orders = Orders::find()
        .filter(OrderCol::BuyerId.eq(user.id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(10)
        .all(&state.orm)
        .await?;

    if orders.is_empty() {
        return Ok("Sizda hali buyurtmalar yo'q.".to_string());
    }

    let names = product_names(state, &orders).await?;
    let mut text = String::from("🛍 <b>Buyurtmalaringiz:</b>\n");
    for order in &orders {
        let name = names.get(&order.product_id).map(String::as_str).unwrap_or("-");
        text.push_str(&format!(
            "\n📦 {}\n{} | {} so'm\nID: <code>{}</code>\n",
            name,
            label_uz(&order.status),
            format_sum(order.total_amount),
            order.id,
        ));
    }
    Ok(text)
}

async fn send_open_orders(state: &AppState, bot: &Bot, chat_id: ChatId) -> anyhow::Result<()> {
    let orders = Orders::find()
        .filter(OrderCol::Status.is_in([
            OrderStatus::Pending.as_str(),
            OrderStatus::Confirmed.as_str(),
        ]))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(10)
        .all(&state.orm)
        .await?;

    if orders.is_empty() {
        reply(bot, chat_id, "Yangi buyurtmalar yo'q. ✨").await?;
        return Ok(());
    }

    let names = product_names(state, &orders).await?;
    for order in orders {
        let name = names.get(&order.product_id).map(String::as_str).unwrap_or("-");
        let mut request = bot
            .send_message(chat_id, order_card(&order, name))
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = status_keyboard(&order) {
            request = request.reply_markup(keyboard);
        }
        request.await?;
    }
    Ok(())
}

async fn stats_text(state: &AppState) -> anyhow::Result<String> {
    let users = Users::find().count(&state.orm).await?;
    let products = Products::find().count(&state.orm).await?;
    let approved = Products::find()
        .filter(ProdCol::IsApproved.eq(true))
        .count(&state.orm)
        .await?;
    let by_status: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status")
            .fetch_all(&state.pool)
            .await?;

    let mut text = format!(
        "📊 <b>Statistika</b>\n\n\
         👥 Foydalanuvchilar: {}\n\
         📦 Mahsulotlar: {} ({} tasdiqlangan)\n\n\
         <b>Buyurtmalar:</b>\n",
        users, products, approved,
    );
    let mut total = 0;
    for (status, count) in &by_status {
        total += *count;
        text.push_str(&format!("{}: {}\n", label_uz(status), count));
    }
    text.push_str(&format!("Jami: {total}"));
    Ok(text)
}

async fn product_names(
    state: &AppState,
    orders: &[OrderModel],
) -> anyhow::Result<HashMap<Uuid, String>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.product_id).collect();
    let names = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    Ok(names)
}

async fn send_order_card(
    state: &AppState,
    bot: &Bot,
    chat_id: ChatId,
    id: Uuid,
) -> ResponseResult<()> {
    match load_card(state, id).await {
        Ok(Some((order, product_name))) => {
            bot.send_message(chat_id, order_card(&order, &product_name))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Ok(None) => {
            reply(bot, chat_id, "Buyurtma topilmadi. 🤷").await?;
        }
        Err(err) => {
            tracing::error!(error = %err, order_id = %id, "card load failed");
            reply(bot, chat_id, "❌ Xatolik yuz berdi. Keyinroq urinib ko'ring.").await?;
        }
    }
    Ok(())
}

async fn load_card(state: &AppState, id: Uuid) -> anyhow::Result<Option<(OrderModel, String)>> {
    let Some(order) = Orders::find_by_id(id).one(&state.orm).await? else {
        return Ok(None);
    };
    let product_name = Products::find_by_id(order.product_id)
        .one(&state.orm)
        .await?
        .map(|p| p.name)
        .unwrap_or_default();
    Ok(Some((order, product_name)))
}

fn order_card(order: &OrderModel, product_name: &str) -> String {
    format!(
        "🧾 <b>Buyurtma</b>\n\
         📦 {}\n\
         🔢 Soni: {}\n\
         💰 Summa: {} so'm\n\
         Holat: {}\n\
         Sana: {}\n\n\
         ID: <code>{}</code>",
        product_name,
        order.quantity,
        format_sum(order.total_amount),
        label_uz(&order.status),
        order.created_at.format("%d.%m.%Y %H:%M"),
        order.id,
    )
}

/// One button per legal next status. Terminal or unknown statuses get no
/// keyboard at all.
fn status_keyboard(order: &OrderModel) -> Option<InlineKeyboardMarkup> {
    let current = OrderStatus::parse(&order.status)?;
    let next = current.next();
    if next.is_empty() {
        return None;
    }
    let row: Vec<InlineKeyboardButton> = next
        .iter()
        .map(|status| {
            InlineKeyboardButton::callback(
                label_uz(status.as_str()),
                status_callback_data(order.id, *status),
            )
        })
        .collect();
    Some(InlineKeyboardMarkup::new(vec![row]))
}

pub fn status_callback_data(order_id: Uuid, status: OrderStatus) -> String {
    format!("st:{}:{}", order_id, status.as_str())
}

pub fn parse_status_callback(data: &str) -> Option<(Uuid, OrderStatus)> {
    let rest = data.strip_prefix("st:")?;
    let (id, status) = rest.split_once(':')?;
    Some((Uuid::parse_str(id).ok()?, OrderStatus::parse(status)?))
}

async fn reply(bot: &Bot, chat_id: ChatId, text: impl Into<String>) -> ResponseResult<()> {
    bot.send_message(chat_id, text.into())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
