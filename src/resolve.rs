use crate::data::{Field, FieldRef, Schema};
use crate::error::{ChartError, Result};
use crate::ir::{
    ResolvedCalc, ResolvedChannel, ResolvedChart, ResolvedEncoding, ResolvedMeasure,
    ResolvedPredicate, ResolvedTransform,
};
use crate::spec::{
    Aggregate, CalcExpr, Channel, ChannelDef, ChartSpec, FieldType, Predicate, SortOrder,
    StackMode, Transform,
};
use tracing::debug;

/// Resolve every field reference in the spec against the record schema and
/// the calculated fields it declares.
pub fn resolve_chart(spec: &ChartSpec) -> Result<ResolvedChart> {
    // 1. Transforms, in order: a calculated field is visible only after its declaration
    let mut schema = Schema::new();
    let mut transforms = Vec::with_capacity(spec.transforms.len());
    for transform in &spec.transforms {
        let resolved = match transform {
            Transform::Filter(p) => ResolvedTransform::Filter(resolve_predicate(p, &schema)?),
            Transform::Calculate { name, expr } => {
                let expr = match expr {
                    CalcExpr::Literal(s) => ResolvedCalc::Literal(s.clone()),
                    CalcExpr::Field(f) => ResolvedCalc::Field(schema.lookup(f)?),
                };
                let target = schema.add_calculated(name.clone());
                ResolvedTransform::Calculate { target, expr }
            }
        };
        transforms.push(resolved);
    }

    // 2. Channels
    let encoding = resolve_encoding(spec, &schema)?;
    debug!(mark = %spec.mark, transforms = transforms.len(), "resolved chart");

    Ok(ResolvedChart {
        mark: spec.mark,
        encoding,
        transforms,
        schema,
        title: spec.title.clone(),
        width: spec.width,
        height: spec.height,
    })
}

pub fn resolve_predicate(predicate: &Predicate, schema: &Schema) -> Result<ResolvedPredicate> {
    Ok(match predicate {
        Predicate::Eq { field, value } => ResolvedPredicate::Eq(schema.lookup(field)?, value.clone()),
        Predicate::Ne { field, value } => ResolvedPredicate::Ne(schema.lookup(field)?, value.clone()),
        Predicate::And(terms) => ResolvedPredicate::And(
            terms
                .iter()
                .map(|t| resolve_predicate(t, schema))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

fn resolve_encoding(spec: &ChartSpec, schema: &Schema) -> Result<ResolvedEncoding> {
    let enc = &spec.encoding;

    let x_def = enc
        .x
        .as_ref()
        .ok_or_else(|| ChartError::InvalidEncoding("an x channel is required".to_string()))?;
    let x = resolve_channel(Channel::X, x_def, schema, true)?;

    let y = match &enc.y {
        Some(def) => resolve_measure(spec, def, schema)?,
        None => resolve_measure(spec, &ChannelDef::count(), schema)?,
    };

    let color = enc
        .color
        .as_ref()
        .map(|d| resolve_channel(Channel::Color, d, schema, false))
        .transpose()?;
    let order = enc
        .order
        .as_ref()
        .map(|d| resolve_channel(Channel::Order, d, schema, false))
        .transpose()?;
    let column = enc
        .column
        .as_ref()
        .map(|d| resolve_channel(Channel::Column, d, schema, false))
        .transpose()?;

    Ok(ResolvedEncoding {
        x,
        y,
        color,
        order,
        column,
    })
}

/// Resolve a channel whose values form an ordered domain. `allow_quantitative`
/// lets numeric fields act as ordered categories.
fn resolve_channel(
    channel: Channel,
    def: &ChannelDef,
    schema: &Schema,
    allow_quantitative: bool,
) -> Result<ResolvedChannel> {
    let name = def.field.as_deref().ok_or_else(|| {
        ChartError::InvalidEncoding(format!("{} channel needs a field", channel))
    })?;
    if def.aggregate.is_some() {
        return Err(ChartError::InvalidEncoding(format!(
            "{} channel cannot be aggregated",
            channel
        )));
    }
    let field = schema.lookup(name)?;
    let field_type = def.field_type.unwrap_or_else(|| infer_type(field));
    if !field_type.is_discrete() && !allow_quantitative {
        return Err(ChartError::InvalidEncoding(format!(
            "{} channel requires an ordinal or nominal field, '{}' is quantitative",
            channel, name
        )));
    }

    Ok(ResolvedChannel {
        field,
        field_type,
        title: def.title.clone().unwrap_or_else(|| name.to_string()),
        sort: def.sort.clone().unwrap_or(SortOrder::Ascending),
    })
}

fn resolve_measure(spec: &ChartSpec, def: &ChannelDef, schema: &Schema) -> Result<ResolvedMeasure> {
    let field = def.field.as_deref().map(|f| schema.lookup(f)).transpose()?;
    let aggregate = def.aggregate.unwrap_or(Aggregate::Sum);
    if field.is_none() && aggregate != Aggregate::Count {
        return Err(ChartError::InvalidEncoding(
            "y channel needs a field unless it counts records".to_string(),
        ));
    }

    let field_type = def.field_type.or_else(|| field.map(infer_type));
    if aggregate == Aggregate::Sum && field_type != Some(FieldType::Quantitative) {
        return Err(ChartError::InvalidEncoding(format!(
            "y channel requires a quantitative field, got '{}'",
            def.field.as_deref().unwrap_or_default()
        )));
    }
    if def.sort.is_some() {
        return Err(ChartError::InvalidEncoding(
            "y channel cannot be sorted".to_string(),
        ));
    }

    let stack = def.stack.unwrap_or(if spec.mark.stacks_by_default() {
        StackMode::Zero
    } else {
        StackMode::None
    });

    let title = match (&def.title, &def.field, aggregate) {
        (Some(t), _, _) => t.clone(),
        (None, _, Aggregate::Count) => "Count of Records".to_string(),
        (None, Some(f), Aggregate::Sum) => f.clone(),
        (None, None, Aggregate::Sum) => String::new(),
    };

    Ok(ResolvedMeasure {
        field,
        aggregate,
        stack,
        title,
    })
}

/// Type used when a channel omits its type tag
fn infer_type(field: FieldRef) -> FieldType {
    match field {
        FieldRef::Column(Field::Count) => FieldType::Quantitative,
        FieldRef::Column(Field::Decade) => FieldType::Ordinal,
        _ => FieldType::Nominal,
    }
}
