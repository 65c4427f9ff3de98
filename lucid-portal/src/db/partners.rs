//! Partner database operations
//!
//! Affiliate listings are fully admin-managed; a default set is seeded the
//! first time the collection is read empty.

use lucid_common::types::Partner;
use lucid_common::Result;
use sqlx::{Row, SqlitePool};

/// Default listings seeded into an empty partners table
pub fn default_partners() -> Vec<Partner> {
    vec![
        Partner {
            id: "1".to_string(),
            name: "Boursorama Bank".to_string(),
            color: "#E6192E".to_string(),
            category: "French bank (PEA/CTO)".to_string(),
            strength: "The PEA reference. French market leader.".to_string(),
            description: "The go-to choice for French investors optimizing taxes through \
                          the PEA. Complete, robust platform."
                .to_string(),
            cta: "Open an account".to_string(),
            link: "https://www.boursorama.com".to_string(),
        },
        Partner {
            id: "2".to_string(),
            name: "Fortuneo".to_string(),
            color: "#1E3932".to_string(),
            category: "French bank (PEA/CTO)".to_string(),
            strength: "Competitive fees on Euronext.".to_string(),
            description: "A solid alternative to Boursorama, frequently cited for aggressive \
                          pricing on small orders and rigorous account management."
                .to_string(),
            cta: "Discover Fortuneo".to_string(),
            link: "https://www.fortuneo.fr".to_string(),
        },
        Partner {
            id: "3".to_string(),
            name: "Trade Republic".to_string(),
            color: "#000000".to_string(),
            category: "Mobile broker (CTO/savings)".to_string(),
            strength: "Scheduled investment plans.".to_string(),
            description: "The most intuitive app to get started. Ideal for automating \
                          investments (DCA) with very low flat fees."
                .to_string(),
            cta: "Try Trade Republic".to_string(),
            link: "https://traderepublic.com".to_string(),
        },
    ]
}

/// Seed the default listings when the table is empty
pub async fn seed_default_partners(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM partners")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Ok(());
    }

    for partner in default_partners() {
        save_partner(pool, &partner).await?;
    }
    tracing::info!("Seeded default partner listings");

    Ok(())
}

/// All partner listings
pub async fn list_partners(pool: &SqlitePool) -> Result<Vec<Partner>> {
    let rows = sqlx::query("SELECT * FROM partners ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Partner {
            id: row.get("id"),
            name: row.get("name"),
            color: row.get("color"),
            category: row.get("category"),
            strength: row.get("strength"),
            description: row.get("description"),
            cta: row.get("cta"),
            link: row.get("link"),
        })
        .collect())
}

/// Insert or update a partner listing by id
pub async fn save_partner(pool: &SqlitePool, partner: &Partner) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO partners (
            id, name, color, category, strength, description, cta, link,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            color = excluded.color,
            category = excluded.category,
            strength = excluded.strength,
            description = excluded.description,
            cta = excluded.cta,
            link = excluded.link,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&partner.id)
    .bind(&partner.name)
    .bind(&partner.color)
    .bind(&partner.category)
    .bind(&partner.strength)
    .bind(&partner.description)
    .bind(&partner.cta)
    .bind(&partner.link)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a partner listing; returns whether a row was removed
pub async fn delete_partner(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM partners WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
