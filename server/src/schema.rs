diesel::table! {
    follows (id) {
        id -> Int8,
        user_id -> Int8,
        author_id -> Int8,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Int8,
        #[max_length = 128]
        name -> Varchar,
        #[max_length = 64]
        measurement_unit -> Varchar,
    }
}

diesel::table! {
    memberships (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        #[max_length = 16]
        kind -> Varchar,
    }
}

diesel::table! {
    recipe_ingredients (id) {
        id -> Int8,
        recipe_id -> Int8,
        ingredient_id -> Int8,
        amount -> Int4,
    }
}

diesel::table! {
    recipe_tags (id) {
        id -> Int8,
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    recipes (id) {
        id -> Int8,
        author_id -> Int8,
        #[max_length = 256]
        name -> Varchar,
        text -> Text,
        cooking_time -> Int4,
        #[max_length = 255]
        image -> Varchar,
        pub_date -> Timestamptz,
        #[max_length = 20]
        short_url -> Varchar,
    }
}

diesel::table! {
    sessions (id) {
        id -> Uuid,
        user_id -> Int8,
        #[max_length = 255]
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tags (id) {
        id -> Int8,
        #[max_length = 32]
        name -> Varchar,
        #[max_length = 32]
        slug -> Varchar,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        #[max_length = 150]
        username -> Varchar,
        #[max_length = 254]
        email -> Varchar,
        #[max_length = 150]
        first_name -> Varchar,
        #[max_length = 150]
        last_name -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(memberships -> recipes (recipe_id));
diesel::joinable!(memberships -> users (user_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipes -> users (author_id));
diesel::joinable!(sessions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    follows,
    ingredients,
    memberships,
    recipe_ingredients,
    recipe_tags,
    recipes,
    sessions,
    tags,
    users,
);
