// libs/shared/database/src/seed.rs
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, AppointmentStatus, ConsultationType, Doctor, Patient, Rating, UnavailabilityEntry,
};

/// Rows loaded into an [`InMemoryStore`](crate::memory::InMemoryStore) at start-up.
#[derive(Debug, Clone, Default)]
pub struct SeedRecords {
    pub doctors: Vec<Doctor>,
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub ratings: Vec<Rating>,
    pub unavailability: Vec<UnavailabilityEntry>,
}

pub fn doctor_id(n: u128) -> Uuid {
    Uuid::from_u128(0xd0c0_0000_0000_4000_8000_0000_0000_0000 + n)
}

pub fn patient_id(n: u128) -> Uuid {
    Uuid::from_u128(0xba7e_0000_0000_4000_8000_0000_0000_0000 + n)
}

pub fn appointment_id(n: u128) -> Uuid {
    Uuid::from_u128(0xa990_0000_0000_4000_8000_0000_0000_0000 + n)
}

fn rating_id(n: u128) -> Uuid {
    Uuid::from_u128(0x5a7e_0000_0000_4000_8000_0000_0000_0000 + n)
}

fn doctor(n: u128, name: &str, specialty: &str, fee: f64, bio: Option<&str>) -> Doctor {
    let id = doctor_id(n);
    Doctor {
        id,
        name: name.to_string(),
        specialty: specialty.to_string(),
        consultation_fee: fee,
        bio: bio.map(str::to_string),
        avatar_url: Some(format!("https://i.pravatar.cc/150?u=doc{}", n)),
    }
}

fn patient(n: u128, name: &str, email: &str, dob: (i32, u32, u32), gender: &str, phone: &str) -> Patient {
    Patient {
        id: patient_id(n),
        name: name.to_string(),
        email: email.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2).unwrap_or_default(),
        gender: gender.to_string(),
        phone: phone.to_string(),
        avatar_url: Some(format!("https://i.pravatar.cc/150?u=pat{}", n)),
    }
}

/// Demo clinic: eight doctors, three patients and a handful of appointments
/// placed relative to `today`.
pub fn demo_records(today: NaiveDate) -> SeedRecords {
    let doctors = vec![
        doctor(1, "Dr. Evelyn Reed", "Cardiology", 150.0, Some(
            "Dr. Reed is a board-certified cardiologist with over 15 years of experience. \
             She is passionate about preventative care and patient education.",
        )),
        doctor(2, "Dr. Marcus Thorne", "Neurology", 200.0, None),
        doctor(3, "Dr. Lena Petrova", "Pediatrics", 120.0, None),
        doctor(4, "Dr. Kenji Tanaka", "Orthopedics", 180.0, None),
        doctor(5, "Dr. Aisha Khan", "Ophthalmology", 160.0, None),
        doctor(6, "Dr. Samuel Green", "General Practice", 0.0, None),
        doctor(7, "Dr. Clara Oswald", "Cardiology", 150.0, None),
        doctor(8, "Dr. Ben Carter", "Neurology", 200.0, None),
    ];

    let patients = vec![
        patient(1, "John Doe", "john.doe@example.com", (1985, 5, 20), "Male", "(123) 456-7890"),
        patient(2, "Jane Smith", "jane.smith@example.com", (1992, 9, 15), "Female", "(234) 567-8901"),
        patient(3, "Peter Jones", "peter.jones@example.com", (1978, 11, 30), "Male", "(345) 678-9012"),
    ];

    let now = Utc::now();
    let booking = |n: u128, pat: &Patient, doc: &Doctor, offset_days: i64, time: &str,
                   status: AppointmentStatus, kind: ConsultationType, notes: Option<&str>| Appointment {
        id: appointment_id(n),
        patient_id: pat.id,
        patient_name: pat.name.clone(),
        doctor_id: doc.id,
        doctor_name: doc.name.clone(),
        department: doc.specialty.clone(),
        date: today + Duration::days(offset_days),
        time_slot: time.to_string(),
        status,
        consultation_type: kind,
        consultation_fee: doc.consultation_fee,
        notes: notes.map(str::to_string),
        rating_id: None,
        created_at: now,
        updated_at: now,
    };

    let (john, jane, peter) = (&patients[0], &patients[1], &patients[2]);
    let mut appointments = vec![
        booking(1, john, &doctors[0], 7, "10:00 AM", AppointmentStatus::Upcoming, ConsultationType::InPerson, None),
        booking(2, john, &doctors[1], -14, "02:30 PM", AppointmentStatus::Completed, ConsultationType::InPerson,
                Some("Follow-up in 6 months.")),
        booking(3, jane, &doctors[0], 10, "11:00 AM", AppointmentStatus::Upcoming, ConsultationType::Online, None),
        booking(4, peter, &doctors[2], 0, "09:00 AM", AppointmentStatus::Upcoming, ConsultationType::InPerson, None),
        booking(5, jane, &doctors[2], 0, "03:00 PM", AppointmentStatus::Upcoming, ConsultationType::Online, None),
        booking(6, john, &doctors[0], -30, "09:00 AM", AppointmentStatus::Completed, ConsultationType::InPerson,
                Some("Prescribed new medication.")),
    ];

    let ratings = vec![
        Rating {
            id: rating_id(1),
            appointment_id: appointments[1].id,
            doctor_id: doctors[1].id,
            patient_id: john.id,
            patient_name: john.name.clone(),
            score: 5,
            feedback: "Dr. Thorne was very thorough and explained everything clearly.".to_string(),
            created_at: now,
        },
        Rating {
            id: rating_id(2),
            appointment_id: appointments[5].id,
            doctor_id: doctors[0].id,
            patient_id: john.id,
            patient_name: john.name.clone(),
            score: 4,
            feedback: "Good experience, but the wait time was a bit long.".to_string(),
            created_at: now,
        },
    ];
    appointments[1].rating_id = Some(ratings[0].id);
    appointments[5].rating_id = Some(ratings[1].id);

    SeedRecords {
        doctors,
        patients,
        appointments,
        ratings,
        unavailability: Vec::new(),
    }
}
