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
        cart::{AddToCartRequest, CartList, EditCartRequest},
        feedback::{AddFeedbackRequest, EditFeedbackRequest, FeedbackList},
        orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
        posts::{PostList, PostRequest},
        users::{ChangePasswordRequest, ChangeRoleRequest, EditUserRequest, UserList},
    },
    entity::{
        orders::{OrderStatus, PaymentMethod},
        user_roles::Role,
    },
    models::{
        Attachment, CartLine, CartModelSummary, CheckoutLine, CheckoutPreview, Feedback, Order,
        OrderItem, Post, UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{admin, cart, feedbacks, health, orders, params, posts, users},
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
        users::my_profile,
        users::edit_my_profile,
        users::change_password,
        cart::cart_list,
        cart::add_to_cart,
        cart::edit_cart,
        cart::remove_cart_item,
        cart::checkout,
        orders::list_my_orders,
        orders::place_order,
        orders::get_order,
        orders::cancel_order,
        feedbacks::list_by_product,
        feedbacks::add_feedback,
        feedbacks::edit_feedback,
        posts::list_posts,
        posts::get_post,
        admin::list_all_orders,
        admin::update_order_status,
        admin::list_users,
        admin::get_user,
        admin::edit_user,
        admin::toggle_user_status,
        admin::change_user_role,
        admin::remove_feedback,
        admin::add_post,
        admin::edit_post,
        admin::remove_post
    ),
    components(
        schemas(
            UserProfile,
            Role,
            CartModelSummary,
            CartLine,
            Attachment,
            CheckoutLine,
            CheckoutPreview,
            OrderStatus,
            PaymentMethod,
            OrderItem,
            Order,
            Feedback,
            Post,
            AddToCartRequest,
            EditCartRequest,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            AddFeedbackRequest,
            EditFeedbackRequest,
            EditUserRequest,
            ChangePasswordRequest,
            ChangeRoleRequest,
            PostRequest,
            CartList,
            OrderList,
            FeedbackList,
            UserList,
            PostList,
            params::PageQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<CartList>,
            ApiResponse<CheckoutPreview>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<Feedback>,
            ApiResponse<FeedbackList>,
            ApiResponse<UserProfile>,
            ApiResponse<UserList>,
            ApiResponse<Post>,
            ApiResponse<PostList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Profile of the current user"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Feedbacks", description = "Product feedback endpoints"),
        (name = "Posts", description = "Blog post endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
