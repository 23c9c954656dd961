//! Scene descriptions.
//!
//! A scene file is JSON holding camera settings, an optional table of named
//! materials and a list of objects. Every object and material carries a
//! `"type"` tag; unknown tags are rejected when the file is parsed, and
//! parameter checks run before anything is rendered.

use crate::camera::{Camera, CameraSettings};
use crate::error::{SceneError, SceneResult};
use crate::{Dielectric, Hittable, HittableList, Lambertian, Marble, Material, Metal, Sphere};
use lumen_math::{Color, Point3, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Parameters of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MaterialDescription {
    Lambertian {
        albedo: Color,
    },
    Metal {
        albedo: Color,
        #[serde(default)]
        fuzz: f32,
    },
    Dielectric {
        #[serde(rename = "refractionIndex", alias = "ir")]
        refraction_index: f32,
    },
    Marble {
        stripe: Color,
        base: Color,
        #[serde(rename = "noiseSeed", default)]
        noise_seed: u64,
    },
}

impl MaterialDescription {
    fn validate(&self, what: &str) -> SceneResult<()> {
        match self {
            MaterialDescription::Lambertian { albedo } => check_finite(what, "albedo", *albedo),
            MaterialDescription::Metal { albedo, fuzz } => {
                check_finite(what, "albedo", *albedo)?;
                if !(0.0..=1.0).contains(fuzz) {
                    return Err(SceneError::invalid(what, format!("fuzz {fuzz} outside [0, 1]")));
                }
                Ok(())
            }
            MaterialDescription::Dielectric { refraction_index } => {
                if !(refraction_index.is_finite() && *refraction_index > 0.0) {
                    return Err(SceneError::invalid(
                        what,
                        format!("refraction index {refraction_index} must be positive"),
                    ));
                }
                Ok(())
            }
            MaterialDescription::Marble { stripe, base, .. } => {
                check_finite(what, "stripe", *stripe)?;
                check_finite(what, "base", *base)
            }
        }
    }

    pub fn build(&self) -> Material {
        match self {
            MaterialDescription::Lambertian { albedo } => Lambertian::new(*albedo).into(),
            MaterialDescription::Metal { albedo, fuzz } => Metal::new(*albedo, *fuzz).into(),
            MaterialDescription::Dielectric { refraction_index } => {
                Dielectric::new(*refraction_index).into()
            }
            MaterialDescription::Marble {
                stripe,
                base,
                noise_seed,
            } => Marble::new(*stripe, *base, *noise_seed).into(),
        }
    }
}

/// A material given inline or by name from the scene's material table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialRef {
    Named(String),
    Inline(MaterialDescription),
}

/// One scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectDescription {
    Sphere {
        center: Point3,
        radius: f32,
        material: MaterialRef,
    },
    List {
        objects: Vec<ObjectDescription>,
    },
}

/// A complete, serializable scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub camera: CameraSettings,
    pub materials: BTreeMap<String, MaterialDescription>,
    pub objects: Vec<ObjectDescription>,
}

/// A built scene: an initialized camera and a shareable world.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub world: Arc<HittableList>,
}

impl SceneDescription {
    pub fn from_json(text: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a scene file from disk.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        log::info!("Loading scene from: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter without building anything.
    pub fn validate(&self) -> SceneResult<()> {
        validate_camera(&self.camera)?;
        for (name, material) in &self.materials {
            material.validate(&format!("material '{name}'"))?;
        }
        for (i, object) in self.objects.iter().enumerate() {
            self.validate_object(object, &format!("object {i}"))?;
        }
        Ok(())
    }

    fn validate_object(&self, object: &ObjectDescription, what: &str) -> SceneResult<()> {
        match object {
            ObjectDescription::Sphere {
                center,
                radius,
                material,
            } => {
                check_finite(what, "center", *center)?;
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(SceneError::invalid(what, format!("radius {radius} must be positive")));
                }
                match material {
                    MaterialRef::Named(name) if !self.materials.contains_key(name) => Err(
                        SceneError::invalid(what, format!("unknown material '{name}'")),
                    ),
                    MaterialRef::Named(_) => Ok(()),
                    MaterialRef::Inline(m) => m.validate(what),
                }
            }
            ObjectDescription::List { objects } => {
                for (i, child) in objects.iter().enumerate() {
                    self.validate_object(child, &format!("{what}.{i}"))?;
                }
                Ok(())
            }
        }
    }

    /// Build the world. Named materials are shared between their users.
    pub fn build_world(&self) -> SceneResult<HittableList> {
        self.validate()?;

        let named: BTreeMap<&str, Arc<Material>> = self
            .materials
            .iter()
            .map(|(name, m)| (name.as_str(), Arc::new(m.build())))
            .collect();

        let world: HittableList = self
            .objects
            .iter()
            .map(|object| build_object(object, &named))
            .collect::<SceneResult<_>>()?;

        log::info!(
            "Built scene with {} objects and {} shared materials",
            world.len(),
            named.len()
        );
        Ok(world)
    }

    /// Build the world and an initialized camera.
    pub fn build(&self) -> SceneResult<Scene> {
        let world = Arc::new(self.build_world()?);
        let mut camera = Camera::from_settings(self.camera.clone());
        camera.initialize();
        Ok(Scene { camera, world })
    }
}

fn build_object(
    object: &ObjectDescription,
    named: &BTreeMap<&str, Arc<Material>>,
) -> SceneResult<Hittable> {
    match object {
        ObjectDescription::Sphere {
            center,
            radius,
            material,
        } => {
            let material = match material {
                MaterialRef::Named(name) => named.get(name.as_str()).cloned().ok_or_else(|| {
                    SceneError::invalid("sphere", format!("unknown material '{name}'"))
                })?,
                MaterialRef::Inline(m) => Arc::new(m.build()),
            };
            Ok(Sphere::new(*center, *radius, material).into())
        }
        ObjectDescription::List { objects } => Ok(objects
            .iter()
            .map(|child| build_object(child, named))
            .collect::<SceneResult<HittableList>>()?
            .into()),
    }
}

fn validate_camera(camera: &CameraSettings) -> SceneResult<()> {
    let what = "camera";
    if camera.image_width == 0 {
        return Err(SceneError::invalid(what, "image width must be at least 1"));
    }
    if camera.samples_per_pixel == 0 {
        return Err(SceneError::invalid(what, "samples per pixel must be at least 1"));
    }
    if !(camera.aspect_ratio.is_finite() && camera.aspect_ratio > 0.0) {
        return Err(SceneError::invalid(what, "aspect ratio must be positive"));
    }
    if !(camera.vfov > 0.0 && camera.vfov < 180.0) {
        return Err(SceneError::invalid(what, "vertical fov must be in (0, 180) degrees"));
    }
    if !(camera.focus_distance.is_finite() && camera.focus_distance > 0.0) {
        return Err(SceneError::invalid(what, "focus distance must be positive"));
    }
    check_finite(what, "look from", camera.look_from)?;
    check_finite(what, "look at", camera.look_at)?;
    check_finite(what, "sky color", camera.sky_color)?;

    let Some(w) = (camera.look_from - camera.look_at).try_normalize() else {
        return Err(SceneError::invalid(what, "look from and look at coincide"));
    };
    if camera.vup.cross(w).try_normalize().is_none() {
        return Err(SceneError::invalid(what, "up vector is parallel to the view direction"));
    }
    Ok(())
}

fn check_finite(what: &str, field: &str, v: Vec3) -> SceneResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(SceneError::invalid(what, format!("{field} {v} is not finite")))
    }
}
