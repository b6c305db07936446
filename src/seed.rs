//! Startup seeding: the admin account, plus a small demo catalog when the
//! catalog is empty. Failures are logged and never stop the server.

use rust_decimal::Decimal;

use crate::domain::{ImageRef, NewProduct, Price, Product};
use crate::error::Result;
use crate::state::AppState;

struct Sample {
    name: &'static str,
    cents: i64,
    description: &'static str,
    category: &'static str,
    image: &'static str,
    stock: i32,
    featured: bool,
    trending: bool,
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "Wireless Bluetooth Headphones",
        cents: 7999,
        description: "High-quality wireless headphones with noise cancellation",
        category: "Electronics",
        image: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500&h=500&fit=crop",
        stock: 50,
        featured: true,
        trending: true,
    },
    Sample {
        name: "Smart Watch Series 5",
        cents: 19999,
        description: "Feature-rich smartwatch with health monitoring",
        category: "Electronics",
        image: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=500&h=500&fit=crop",
        stock: 30,
        featured: true,
        trending: true,
    },
    Sample {
        name: "Running Shoes Pro",
        cents: 12999,
        description: "Comfortable running shoes for athletes",
        category: "Fashion",
        image: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500&h=500&fit=crop",
        stock: 25,
        featured: true,
        trending: false,
    },
];

pub async fn run(state: AppState) {
    match seed(&state).await {
        Ok(0) => tracing::debug!("catalog already populated, skipping sample products"),
        Ok(n) => tracing::info!(count = n, "sample products added"),
        Err(e) => tracing::error!(error = %e, "seeding sample data failed"),
    }
}

/// Returns how many sample products were inserted.
async fn seed(state: &AppState) -> Result<usize> {
    let admin = &state.config.admin;
    let admin = state.accounts.ensure_admin(&admin.name, &admin.email, &admin.password).await?;

    if state.store.count_products().await? > 0 {
        return Ok(0);
    }
    for sample in SAMPLES {
        let new = NewProduct {
            name: sample.name.to_string(),
            price: Price::new(Decimal::new(sample.cents, 2))?,
            description: sample.description.to_string(),
            category: sample.category.to_string(),
            stock: sample.stock,
            featured: sample.featured,
            trending: sample.trending,
        };
        let product = Product::create(new, ImageRef::new(sample.image), admin.id);
        state.store.insert_product(&product).await?;
    }
    Ok(SAMPLES.len())
}
