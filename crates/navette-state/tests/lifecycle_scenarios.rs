//! End-to-end lifecycle scenarios for parcels and mandates.

use navette_core::{EntityKind, Party, PaymentMethod, ReferenceCode, Role, UserId};
use navette_state::{
    can_transition, can_transition_tagged, HistoryActor, Lifecycle, Mandate, MandateDetails,
    MandateStatus, Parcel, ParcelDetails, ParcelStatus, Rejection, TrackedError,
};

fn party(name: &str) -> Party {
    Party {
        name: name.into(),
        phone: "+225 07 08 09 10 11".into(),
        address: Some("Cocody, Abidjan".into()),
    }
}

fn actor(role: Role) -> HistoryActor {
    HistoryActor {
        id: UserId::new().to_string(),
        last_name: "Traoré".into(),
        first_name: "Issa".into(),
        role,
    }
}

fn parcel() -> Parcel {
    let reference = ReferenceCode::issue(EntityKind::Parcel, 2026, 42).unwrap();
    Parcel::register(
        reference,
        ParcelDetails {
            sender: party("Awa Koné"),
            recipient: party("Moussa Diallo"),
            contents: "Documents".into(),
            weight_grams: Some(350),
            tariff_fcfa: 2_500,
            payment_method: PaymentMethod::Wave,
            origin_agency: None,
            destination_agency: None,
        },
        None,
        None,
    )
    .unwrap()
}

#[test]
fn parcel_goes_from_counter_to_door() {
    let mut p = parcel();
    assert_eq!(p.status(), ParcelStatus::EnAttente);

    p.tracking
        .transition(ParcelStatus::PrisEnCharge, Role::Gerant, "Reçu à l'agence", Some(actor(Role::Gerant)))
        .unwrap();
    p.tracking
        .transition(ParcelStatus::EnLivraison, Role::Livreur, "En route", Some(actor(Role::Livreur)))
        .unwrap();
    p.tracking
        .transition(ParcelStatus::Livre, Role::Livreur, "Remis au destinataire", None)
        .unwrap();

    assert_eq!(p.status(), ParcelStatus::Livre);
    let statuses: Vec<_> = p.tracking.history().entries().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            ParcelStatus::EnAttente,
            ParcelStatus::PrisEnCharge,
            ParcelStatus::EnLivraison,
            ParcelStatus::Livre
        ]
    );
    assert!(p.tracking.history().is_ordered());

    for to in ParcelStatus::all() {
        for role in Role::ALL {
            let err = p.tracking.transition(*to, role, "", None).unwrap_err();
            assert!(matches!(
                err,
                TrackedError::Illegal(ref e) if e.reason == Rejection::Terminal
            ));
        }
    }
    assert_eq!(p.tracking.history().len(), 4);
}

#[test]
fn parcel_through_transit() {
    let mut p = parcel();
    for (to, role) in [
        (ParcelStatus::PrisEnCharge, Role::Admin),
        (ParcelStatus::EnTransit, Role::Livreur),
        (ParcelStatus::EnLivraison, Role::Gerant),
        (ParcelStatus::EchecLivraison, Role::Livreur),
    ] {
        p.tracking.transition(to, role, "", None).unwrap();
    }
    assert!(p.tracking.is_closed());
    assert!(p.status().is_failure());
}

#[test]
fn role_gating_on_first_step() {
    assert!(!can_transition(ParcelStatus::EnAttente, ParcelStatus::PrisEnCharge, Role::Client));
    assert!(can_transition(ParcelStatus::EnAttente, ParcelStatus::PrisEnCharge, Role::Gerant));
    assert!(!can_transition_tagged(EntityKind::Parcel, "en_attente", "pris_en_charge", Role::Client));
    assert!(can_transition_tagged(EntityKind::Parcel, "en_attente", "pris_en_charge", Role::Gerant));
}

#[test]
fn courier_assignment_closes_with_the_record() {
    let mut p = parcel();
    let courier = UserId::new();
    p.assign_courier(courier).unwrap();
    assert_eq!(p.courier(), Some(courier));

    p.tracking.transition(ParcelStatus::Annule, Role::Gerant, "Annulé par le client", None).unwrap();
    let err = p.assign_courier(UserId::new()).unwrap_err();
    assert!(matches!(err, TrackedError::Closed { status: "annule", .. }));
    assert_eq!(p.courier(), Some(courier));
}

#[test]
fn register_validates_parties() {
    let reference = ReferenceCode::issue(EntityKind::Parcel, 2026, 43).unwrap();
    let mut recipient = party("Moussa Diallo");
    recipient.phone = "123".into();
    let err = Parcel::register(
        reference,
        ParcelDetails {
            sender: party("Awa Koné"),
            recipient,
            contents: "Documents".into(),
            weight_grams: None,
            tariff_fcfa: 1_000,
            payment_method: PaymentMethod::Especes,
            origin_agency: None,
            destination_agency: None,
        },
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, TrackedError::Invalid(_)));
}

#[test]
fn mandate_full_errand() {
    let reference = ReferenceCode::issue(EntityKind::Mandate, 2026, 7).unwrap();
    let mut m = Mandate::open(
        reference,
        MandateDetails {
            requester: party("Fatou Ndiaye"),
            document_type: "Extrait d'acte de naissance".into(),
            administration: "Mairie du Plateau".into(),
            tariff_fcfa: 5_000,
            payment_method: PaymentMethod::OrangeMoney,
            agency: None,
        },
        Some(UserId::new()),
        None,
    )
    .unwrap();

    let steps = [
        (MandateStatus::DocumentsVerifies, Role::Gerant),
        (MandateStatus::ProcurationSignee, Role::Gerant),
        (MandateStatus::DeposeAdministration, Role::Livreur),
        (MandateStatus::EnTraitement, Role::Livreur),
        (MandateStatus::DocumentObtenu, Role::Livreur),
        (MandateStatus::EnLivraison, Role::Gerant),
        (MandateStatus::Livre, Role::Livreur),
    ];
    for (to, role) in steps {
        m.tracking.transition(to, role, "", None).unwrap();
    }
    assert_eq!(m.status(), MandateStatus::Livre);
    assert_eq!(m.tracking.history().len(), 8);
}

#[test]
fn mandate_rejects_parcel_codes() {
    let reference = ReferenceCode::issue(EntityKind::Parcel, 2026, 8).unwrap();
    let err = Mandate::open(
        reference,
        MandateDetails {
            requester: party("Fatou Ndiaye"),
            document_type: "Casier judiciaire".into(),
            administration: "Tribunal".into(),
            tariff_fcfa: 3_000,
            payment_method: PaymentMethod::Especes,
            agency: None,
        },
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, TrackedError::KindMismatch { .. }));
}

#[test]
fn stored_parcel_with_legacy_tags_loads() {
    let raw = serde_json::json!({
        "tracking": {
            "reference": "SHP-2024-000321",
            "status": "en_preparation",
            "history": [
                { "statut": "en_attente", "description": "", "date": "2024-05-01T08:00:00Z" },
                { "statut": "en_preparation", "description": "", "date": "2024-05-01T09:00:00Z",
                  "utilisateur": { "id": "7", "nom": "Koné", "prenom": "Awa", "role": "gerant" } }
            ],
            "created_at": "2024-05-01T08:00:00Z",
            "updated_at": "2024-05-01T09:00:00Z"
        },
        "sender": { "name": "A", "phone": "0708091011" },
        "recipient": { "name": "B", "phone": "0708091012" },
        "contents": "Pagne",
        "tariff_fcfa": 1500
    });
    let p: Parcel = serde_json::from_value(raw).unwrap();
    assert_eq!(p.reference().as_str(), "CLS-2024-000321");
    assert_eq!(p.status(), ParcelStatus::PrisEnCharge);
    assert_eq!(p.payment_method, PaymentMethod::Especes);

    let out = serde_json::to_value(&p).unwrap();
    assert_eq!(out["tracking"]["status"], "pris_en_charge");
    assert_eq!(out["tracking"]["history"][1]["statut"], "pris_en_charge");
}
