//! Integration tests for the session registry

use hidra_fields::PointList;
use hidra_strain::{
    DReference, Direction, ElasticConstants, Error, SessionRegistry, StrainField, StressType,
};
use rstest::{fixture, rstest};

fn strain(value: f64) -> StrainField {
    let points = PointList::new(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2]).unwrap();
    StrainField::from_strain("peak", &[value, value], &[1e-5, 1e-5], points).unwrap()
}

#[fixture]
fn registry() -> SessionRegistry {
    let mut registry = SessionRegistry::new();
    registry
        .create_session("weld", StressType::InPlaneStress)
        .unwrap();
    registry
        .create_session("plate", StressType::Diagonal)
        .unwrap();
    registry
}

#[rstest]
fn create_and_switch(mut registry: SessionRegistry) {
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), vec!["plate", "weld"]);

    // the last created session is active
    assert_eq!(registry.current().unwrap().name(), "plate");

    registry.switch_session("weld").unwrap();
    assert_eq!(
        registry.current().unwrap().stress_type(),
        StressType::InPlaneStress
    );

    assert!(matches!(
        registry.create_session("weld", StressType::Diagonal),
        Err(Error::SessionExists(_))
    ));
    assert!(matches!(
        registry.switch_session("bridge"),
        Err(Error::SessionNotFound(_))
    ));
    assert!(matches!(registry.get("bridge"), Err(Error::SessionNotFound(_))));
}

#[rstest]
fn destroy_active(mut registry: SessionRegistry) {
    let removed = registry.destroy_session("plate").unwrap();
    assert_eq!(removed.name(), "plate");
    assert!(matches!(registry.current(), Err(Error::NoActiveSession)));
    assert!(matches!(registry.current_mut(), Err(Error::NoActiveSession)));

    assert!(registry.get("weld").is_ok());
    assert!(matches!(
        registry.destroy_session("plate"),
        Err(Error::SessionNotFound(_))
    ));
}

#[rstest]
fn compute_stress(mut registry: SessionRegistry) {
    registry.switch_session("weld").unwrap();
    let session = registry.current_mut().unwrap();

    session.set_strain(Direction::D11, strain(1e-3));
    assert!(matches!(
        session.compute_stress(),
        Err(Error::MissingStrain(_))
    ));

    session.set_strain(Direction::D22, strain(1e-3));
    let stress = session.compute_stress().unwrap();
    assert_eq!(stress.len(), 2);
    assert!(stress.stress33().values().iter().all(|v| *v == 0.0));

    // equal biaxial plane stress is E / (1 - v) times the strain
    let expected = 200.0 / (1.0 - 0.3) * 1000.0 * 1e-3;
    assert!((stress.values()[0] - expected).abs() < 1e-6);

    session
        .set_elastic_constants(ElasticConstants {
            youngs_modulus: 100.0,
            poisson_ratio: 0.3,
        })
        .unwrap();
    let halved = session.stress().unwrap().values()[0];
    assert!((halved - 0.5 * expected).abs() < 1e-6);

    session
        .set_d_reference(&DReference::Constant(1.001, 0.0))
        .unwrap();
    assert!(session.stress().unwrap().values()[0].abs() < 1e-6);
    assert!(session.strain(Direction::D11).unwrap().values()[0].abs() < 1e-6);
}

#[rstest]
fn diagonal_session_needs_three_directions(mut registry: SessionRegistry) {
    let session = registry.current_mut().unwrap();
    session.set_strain(Direction::D11, strain(1e-3));
    session.set_strain(Direction::D22, strain(1e-3));

    assert!(matches!(
        session.compute_stress(),
        Err(Error::MissingStrain33(_))
    ));

    session.set_strain(Direction::D33, strain(1e-3));
    assert!(session.compute_stress().is_ok());
}

#[rstest]
fn invalid_constants_are_rejected(mut registry: SessionRegistry) {
    let session = registry.current_mut().unwrap();
    for direction in Direction::ALL {
        session.set_strain(direction, strain(2e-4));
    }
    session.compute_stress().unwrap();

    let result = session.set_elastic_constants(ElasticConstants {
        youngs_modulus: 210.0,
        poisson_ratio: 0.6,
    });
    assert!(matches!(result, Err(Error::OutOfRange { .. })));
    assert_eq!(session.elastic_constants(), ElasticConstants::default());
    assert_eq!(session.stress().unwrap().youngs_modulus(), 200.0);
}

#[rstest]
fn elastic_constants_from_json() {
    let constants: ElasticConstants =
        serde_json::from_str(r#"{"youngs_modulus": 210.0, "poisson_ratio": 0.28}"#).unwrap();
    assert_eq!(constants.youngs_modulus, 210.0);
    assert_eq!(constants.poisson_ratio, 0.28);

    let constants: ElasticConstants = serde_json::from_str("{}").unwrap();
    assert_eq!(constants, ElasticConstants::default());
}
