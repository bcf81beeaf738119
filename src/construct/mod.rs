pub mod hull;
pub mod morph;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use ndarray::{Array3, Zip};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::labels::{KIDNEY, LabelRegistry, URETER};
use crate::volume::{Volume, VolumeSource, mask};

pub const DEFAULT_CLOSING_RADIUS_MM: f64 = 11.0;

/// Delineations per class id. Each entry is one binary delineation (non-zero
/// voxels are foreground) of one instance of that class.
pub type LabelGroups<S> = BTreeMap<u8, Vec<S>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstructionPolicy {
    #[default]
    Default,
    ConvexHull,
    ClosedKidney {
        radius_mm: f64,
    },
    UreterOnTop,
}

impl ConstructionPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ConvexHull => "convex-hull",
            Self::ClosedKidney { .. } => "closed-kidney",
            Self::UreterOnTop => "ureter-on-top",
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

/// Order in which classes are painted; later classes overwrite earlier ones.
pub fn painting_order(registry: &LabelRegistry, policy: ConstructionPolicy) -> Result<Vec<u8>> {
    let order = registry.construction_order().to_vec();
    if !matches!(policy, ConstructionPolicy::UreterOnTop) {
        return Ok(order);
    }
    let (kidney, ureter) = kidney_and_ureter(registry, policy)?;
    let mut out = vec![kidney, ureter];
    out.extend(order.into_iter().filter(|&id| id != kidney && id != ureter));
    Ok(out)
}

/// Paints every delineation into one multi-class volume.
pub fn build_segmentation<S>(
    registry: &LabelRegistry,
    policy: ConstructionPolicy,
    groups: &LabelGroups<S>,
) -> Result<Volume>
where
    S: VolumeSource,
{
    for id in groups.keys() {
        if registry.class_name(*id).is_none() {
            return Err(EvalError::config(format!("unknown class id {id} in delineation groups")).into());
        }
    }

    let order = painting_order(registry, policy)?;
    let envelope = kidney_envelope(registry, policy, groups)?;
    let ureter_swap = match &envelope {
        Some(_) => Some(kidney_and_ureter(registry, policy)?),
        None => None,
    };

    let mut out: Option<Volume> = None;
    for label in order {
        let Some(sources) = groups.get(&label) else {
            continue;
        };
        for source in sources {
            let delineation = source
                .load()
                .with_context(|| format!("loading {}", source.describe()))?;
            let seg = out.get_or_insert_with(|| Volume::zeros_like(&delineation));
            seg.ensure_same_shape(&delineation)?;

            match (&envelope, ureter_swap) {
                (Some(env), Some((kidney, ureter))) if label == ureter => {
                    if env.shape() != seg.labels.shape() {
                        return Err(shape_error(env, &seg.labels).into());
                    }
                    Zip::from(&mut seg.labels)
                        .and(&delineation.labels)
                        .and(env)
                        .for_each(|o, &v, &inside| {
                            if v != 0 {
                                *o = if inside { kidney } else { label };
                            }
                        });
                }
                _ => {
                    Zip::from(&mut seg.labels)
                        .and(&delineation.labels)
                        .for_each(|o, &v| {
                            if v != 0 {
                                *o = label;
                            }
                        });
                }
            }
        }
    }

    out.ok_or_else(|| EvalError::config("no delineations to build a segmentation from").into())
}

/// Union over kidney instances of the per-instance envelope, for the
/// policies that need one.
fn kidney_envelope<S>(
    registry: &LabelRegistry,
    policy: ConstructionPolicy,
    groups: &LabelGroups<S>,
) -> Result<Option<Array3<bool>>>
where
    S: VolumeSource,
{
    if !matches!(
        policy,
        ConstructionPolicy::ConvexHull | ConstructionPolicy::ClosedKidney { .. }
    ) {
        return Ok(None);
    }
    let (kidney, _) = kidney_and_ureter(registry, policy)?;
    let Some(sources) = groups.get(&kidney) else {
        return Ok(None);
    };

    let mut acc: Option<Array3<bool>> = None;
    for source in sources {
        let delineation = source
            .load()
            .with_context(|| format!("loading {}", source.describe()))?;
        let fg = delineation.foreground();
        let env = match policy {
            ConstructionPolicy::ClosedKidney { radius_mm } => {
                morph::closing(&fg, delineation.spacing, radius_mm)
            }
            _ => hull::convex_hull_mask(&fg),
        };
        match acc.as_mut() {
            None => acc = Some(env),
            Some(a) => {
                if a.shape() != env.shape() {
                    return Err(shape_error(a, &env).into());
                }
                mask::union_in_place(a, &env);
            }
        }
    }
    Ok(acc)
}

fn kidney_and_ureter(registry: &LabelRegistry, policy: ConstructionPolicy) -> Result<(u8, u8)> {
    let kidney = registry.class_id(KIDNEY);
    let ureter = registry.class_id(URETER);
    match (kidney, ureter) {
        (Some(k), Some(u)) => Ok((k, u)),
        _ => Err(EvalError::config(format!(
            "policy {} needs '{}' and '{}' classes in the label table",
            policy.name(),
            KIDNEY,
            URETER
        ))
        .into()),
    }
}

fn shape_error<A, B>(a: &Array3<A>, b: &Array3<B>) -> EvalError {
    let l = a.shape();
    let r = b.shape();
    EvalError::ShapeMismatch {
        left: [l[0], l[1], l[2]],
        right: [r[0], r[1], r[2]],
    }
}
