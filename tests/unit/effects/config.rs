use super::*;

fn is_config_err(err: RidgelineError) -> bool {
    err.to_string().starts_with("configuration error:")
}

#[test]
fn effect_names_and_aliases() {
    assert_eq!(EffectKind::from_name("Particle_Burst").unwrap(), EffectKind::ParticleBurst);
    assert_eq!(EffectKind::from_name("breathe").unwrap(), EffectKind::Breathing);
    assert_eq!(EffectKind::from_name("stagger").unwrap(), EffectKind::StaggerReveal);
    for kind in EffectKind::ALL {
        assert_eq!(EffectKind::from_name(kind.name()).unwrap(), kind);
    }
    assert!(is_config_err(EffectKind::from_name("confetti").unwrap_err()));
}

#[test]
fn defaults_resolve() {
    let resolved = EffectConfig::new("about", "about")
        .resolve(EffectKind::ParticleBurst)
        .unwrap();
    assert_eq!(resolved.particle_count, None);
    assert!(resolved.palette.is_empty());
    assert_eq!(resolved.duration_multiplier, 1.0);
    assert_eq!(resolved.ease, None);
    assert_eq!(resolved.zone, None);
}

#[test]
fn every_option_is_validated() {
    let base = || EffectConfig::new("s", "t");
    let bad = [
        base().with_particle_count(0),
        base().with_particle_count(5000),
        base().with_palette(["#A5744E", "brown"]),
        base().with_duration_multiplier(0.0),
        base().with_duration_multiplier(12.0),
        base().with_duration_multiplier(f64::NAN),
        base().with_ease("bouncy"),
        base().with_repeat("forever"),
        base().with_params(serde_json::json!(3)),
        base().with_trigger(TriggerConfig::new("top 80%", ZoneMode::Scrub)),
        base().with_trigger(TriggerConfig {
            start: "top 80%".into(),
            end: None,
            mode: "sometimes".into(),
        }),
        base().with_trigger(TriggerConfig::new("over there", ZoneMode::OneShot)),
        EffectConfig::new("", "t"),
    ];
    for cfg in bad {
        let err = cfg.resolve(EffectKind::Parallax).unwrap_err();
        assert!(is_config_err(err), "{cfg:?}");
    }
}

#[test]
fn full_config_resolves() {
    let cfg = EffectConfig::new("home", "hero")
        .with_particle_count(120)
        .with_palette(["#A5744E", "#f2d275"])
        .with_duration_multiplier(1.5)
        .with_ease("power2.inOut")
        .with_repeat("yoyo")
        .with_trigger(TriggerConfig::new("top 60%", ZoneMode::Scrub).until("top 20%"));
    let r = cfg.resolve(EffectKind::CanvasReveal).unwrap();
    assert_eq!(r.particle_count, Some(120));
    assert_eq!(r.palette[1], Rgba8::rgb(0xF2, 0xD2, 0x75));
    assert_eq!(r.ease, Some(Ease::InOutCubic));
    assert_eq!(r.repeat, Some(RepeatMode::Yoyo));
    let zone = r.zone.unwrap();
    assert_eq!(zone.id, "canvas-reveal:hero");
    assert_eq!(zone.mode, ZoneMode::Scrub);
}

#[test]
fn trigger_config_and_zone_convert_losslessly() {
    let cfg = TriggerConfig::new("center 75%", ZoneMode::Toggle).until("bottom top");
    let zone = cfg.to_zone("z", "team").unwrap();
    assert_eq!(TriggerConfig::from_zone(&zone), cfg);
    assert_eq!(TriggerConfig::from_zone(&zone).to_zone("z", "team").unwrap(), zone);
}

#[test]
fn config_deserializes_with_defaults() {
    let cfg: EffectConfig = serde_json::from_str(
        r#"{ "section": "about", "target": "about", "trigger": { "start": "top 50%" } }"#,
    )
    .unwrap();
    assert_eq!(cfg.duration_multiplier, 1.0);
    assert_eq!(cfg.trigger.as_ref().unwrap().mode, "one_shot");
    assert!(cfg.params.is_null());

    let json = serde_json::to_value(&cfg).unwrap();
    assert!(json.get("palette").is_none());
    let back: EffectConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn params_accessors_type_check() {
    let v = serde_json::json!({ "distance": 40, "kind": "circle", "split": false, "paths": [] });
    let p = Params::new(&v);
    assert_eq!(p.f64_or("distance", 0.0).unwrap(), 40.0);
    assert_eq!(p.f64_or("missing", 2.5).unwrap(), 2.5);
    assert_eq!(p.str_or("kind", "x").unwrap(), "circle");
    assert!(!p.bool_or("split", true).unwrap());
    assert!(p.array("paths").unwrap().unwrap().is_empty());
    assert!(p.f64_or("kind", 0.0).is_err());
    assert!(p.bool_or("distance", false).is_err());
}
