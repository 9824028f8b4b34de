use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        ads::{AdList, CreateAdRequest, UpdateAdRequest},
        applications::{
            ApplicationDecisionRequest, ComplaintRequest, ContactMessageList,
            ContactMessageRequest, ContactRequestList, SellerApplicationList,
            SellerApplicationRequest,
        },
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        chat::{
            ConversationList, ConversationSummary, MessageList, OpenConversationRequest,
            SendMessageRequest,
        },
        orders::{OrderList, OrderTracking, PlaceOrderRequest, UpdateOrderStatusRequest},
        products::{
            CreateProductRequest, CreateReviewRequest, ModerateProductRequest, ProductList,
            ReviewList, UpdateProductRequest,
        },
        sellers::{SellerAnalytics, SellerCustomer, SellerCustomerList, StatusCount},
        users::{UpdateUserFlagsRequest, UserList},
    },
    models::{
        Ad, ContactMessage, ContactRequest, Conversation, Message, Order, Product, Review,
        SellerApplication, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, ads, applications, auth, chat, health, orders, params,
        products as product_routes, seller,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::like_product,
        product_routes::unlike_product,
        product_routes::list_favorites,
        product_routes::list_reviews,
        product_routes::create_review,
        ads::list_ads,
        ads::click_ad,
        orders::place_order,
        orders::list_my_orders,
        orders::track_order,
        orders::get_my_order,
        seller::list_my_products,
        seller::create_product,
        seller::update_product,
        seller::delete_product,
        seller::list_orders,
        seller::update_order_status,
        seller::list_customers,
        seller::analytics,
        admin::list_users,
        admin::update_user_flags,
        admin::export_users,
        admin::list_products,
        admin::moderate_product,
        admin::delete_product,
        admin::list_orders,
        admin::export_orders,
        admin::get_order,
        admin::update_order_status,
        admin::list_ads,
        admin::create_ad,
        admin::update_ad,
        admin::delete_ad,
        admin::list_seller_applications,
        admin::decide_seller_application,
        admin::list_contact_messages,
        admin::decide_contact_message,
        admin::list_complaints,
        admin::decide_complaint,
        applications::submit_seller_application,
        applications::submit_contact_message,
        applications::submit_complaint,
        chat::open_conversation,
        chat::list_conversations,
        chat::list_messages,
        chat::send_message,
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            Review,
            Conversation,
            Message,
            SellerApplication,
            ContactMessage,
            ContactRequest,
            Ad,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ModerateProductRequest,
            CreateReviewRequest,
            ProductList,
            ReviewList,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderTracking,
            UpdateUserFlagsRequest,
            UserList,
            SellerApplicationRequest,
            ContactMessageRequest,
            ComplaintRequest,
            ApplicationDecisionRequest,
            SellerApplicationList,
            ContactMessageList,
            ContactRequestList,
            CreateAdRequest,
            UpdateAdRequest,
            AdList,
            OpenConversationRequest,
            SendMessageRequest,
            ConversationSummary,
            ConversationList,
            MessageList,
            SellerCustomer,
            SellerCustomerList,
            StatusCount,
            SellerAnalytics,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderTracking>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Storefront products, likes and reviews"),
        (name = "Ads", description = "Storefront banners"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Seller", description = "Seller panel"),
        (name = "Admin", description = "Admin panel"),
        (name = "Applications", description = "Seller applications, contact form, complaints"),
        (name = "Chat", description = "Buyer and seller messaging"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
