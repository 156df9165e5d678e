//! Reference collections: industries, sub-industries, states and cities.

use super::fields::{flag, slugify, text};
use super::{legacy, TransformContext};
use crate::dump::Row;
use crate::parser::ScalarValue;
use serde::Serialize;
use uuid::Uuid;

pub const INDUSTRIES: &str = "industries";
pub const SUB_INDUSTRIES: &str = "sub_industries";
pub const STATES: &str = "states";
pub const CITIES: &str = "cities";

#[derive(Debug, Clone, Serialize)]
pub struct IndustryDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub name: String,
    pub slug: String,
    pub sub_industries: Vec<Uuid>,
    pub is_active: bool,
}

pub fn build_industry(row: &Row, ctx: &TransformContext<'_>) -> Option<IndustryDoc> {
    let (sid, id) = ctx.own_id(INDUSTRIES, row)?;
    let name = text(row, &["name", "title"]).unwrap_or_else(|| format!("Industry {}", sid));

    let sub_industries = ctx
        .lookups
        .sub_industries_by_industry
        .get(&sid)
        .map(|subs| {
            subs.iter()
                .filter_map(|s| ctx.ids.get_or_create(SUB_INDUSTRIES, s))
                .collect()
        })
        .unwrap_or_default();

    Some(IndustryDoc {
        id,
        legacy_id: legacy(&sid),
        slug: text(row, &["slug"]).unwrap_or_else(|| slugify(&name)),
        name,
        sub_industries,
        is_active: flag(row, &["is_active", "status"]).unwrap_or(true),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SubIndustryDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub industry_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
}

pub fn build_sub_industry(row: &Row, ctx: &TransformContext<'_>) -> Option<SubIndustryDoc> {
    let (sid, id) = ctx.own_id(SUB_INDUSTRIES, row)?;
    let name = text(row, &["name", "title"]).unwrap_or_else(|| format!("Sub-industry {}", sid));

    Some(SubIndustryDoc {
        id,
        legacy_id: legacy(&sid),
        industry_id: ctx.reference(SUB_INDUSTRIES, INDUSTRIES, row, &["industry_id", "parent_id"]),
        slug: text(row, &["slug"]).unwrap_or_else(|| slugify(&name)),
        name,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StateDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub name: String,
    pub code: Option<String>,
}

pub fn build_state(row: &Row, ctx: &TransformContext<'_>) -> Option<StateDoc> {
    let (sid, id) = ctx.own_id(STATES, row)?;
    Some(StateDoc {
        id,
        legacy_id: legacy(&sid),
        name: text(row, &["name", "state_name"]).unwrap_or_else(|| format!("State {}", sid)),
        code: text(row, &["code", "abbreviation", "short_name"]).map(|c| c.to_ascii_uppercase()),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CityDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub name: String,
    pub state_id: Option<Uuid>,
    pub state: Option<String>,
}

pub fn build_city(row: &Row, ctx: &TransformContext<'_>) -> Option<CityDoc> {
    let (sid, id) = ctx.own_id(CITIES, row)?;
    let location = ctx.location(CITIES, row);
    Some(CityDoc {
        id,
        legacy_id: legacy(&sid),
        name: text(row, &["name", "city_name"]).unwrap_or_else(|| format!("City {}", sid)),
        state_id: location.as_ref().and_then(|l| l.state_id),
        state: location.and_then(|l| l.state),
    })
}
