//! Shared harness for the integration test binaries: one in-memory store
//! wired into all three services, with a controllable clock and a
//! recording event sink.
#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use backend::config::DispatchConfig;
use backend::domain::acceptance::{AcceptancePorts, AcceptanceService};
use backend::domain::boarding_pass::{BoardingPass, PassPlan, PassStatus, PassType};
use backend::domain::dispatch::{CreateRideRequest, DispatchPorts, DispatchService};
use backend::domain::geo::{GeoPoint, ServiceZone};
use backend::domain::ids::{PassId, UserId, VehicleId};
use backend::domain::lifecycle::{LifecyclePorts, LifecycleService};
use backend::domain::ride::RideLocation;
use backend::domain::vehicle::Vehicle;
use backend::domain::UserSummary;
use backend::outbound::events::RecordingEventSink;
use backend::outbound::memory::{InMemoryStore, MonotonicCounter};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

/// Clock whose reported time the test advances explicitly.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub fn downtown_zone() -> ServiceZone {
    ServiceZone::new("downtown", GeoPoint::new(42.6977, 23.3219), 5.0)
}

pub fn downtown_location(address: &str) -> RideLocation {
    RideLocation {
        address: address.to_owned(),
        point: GeoPoint::new(42.6977, 23.3219),
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub events: Arc<RecordingEventSink>,
    pub clock: Arc<TestClock>,
    pub dispatch: DispatchService,
    pub acceptance: AcceptanceService,
    pub lifecycle: LifecycleService,
}

impl Harness {
    pub fn new() -> Self {
        backend::telemetry::init();

        let store = Arc::new(InMemoryStore::new());
        let events = Arc::new(RecordingEventSink::default());
        let clock = Arc::new(TestClock::new(fixture_now()));
        let counter = Arc::new(MonotonicCounter::new());
        let config = DispatchConfig::new(vec![downtown_zone()]);

        let dispatch = DispatchService::new(
            config.clone(),
            DispatchPorts {
                users: store.clone(),
                passes: store.clone(),
                vehicles: store.clone(),
                rides: store.clone(),
                counter,
                events: events.clone(),
                clock: clock.clone(),
            },
        );
        let acceptance = AcceptanceService::new(
            config,
            AcceptancePorts {
                requests: store.clone(),
                rides: store.clone(),
                vehicles: store.clone(),
                events: events.clone(),
                clock: clock.clone(),
            },
        );
        let lifecycle = LifecycleService::new(LifecyclePorts {
            rides: store.clone(),
            users: store.clone(),
            events: events.clone(),
            clock: clock.clone(),
        });

        Self {
            store,
            events,
            clock,
            dispatch,
            acceptance,
            lifecycle,
        }
    }

    pub fn seed_rider(&self) -> UserId {
        let rider_id = UserId::random();
        self.store.seed_user(UserSummary {
            id: rider_id,
            active: true,
            blocked: false,
        });
        rider_id
    }

    /// Seed a driver account with an online, unbooked vehicle.
    pub fn seed_driver_with_vehicle(&self) -> (UserId, VehicleId) {
        let driver_id = UserId::random();
        self.store.seed_user(UserSummary {
            id: driver_id,
            active: true,
            blocked: false,
        });
        let vehicle_id = VehicleId::random();
        self.store.seed_vehicle(Vehicle {
            id: vehicle_id,
            current_driver_id: Some(driver_id),
            online: true,
            booked: false,
            registration_number: "CA1234AB".to_owned(),
        });
        (driver_id, vehicle_id)
    }

    /// Seed an active limited pass with an already-activated 30 day window.
    pub fn seed_activated_limited_pass(
        &self,
        rider_id: UserId,
        total_trips: u32,
        total_daily_trips: u32,
    ) -> PassId {
        let pass_id = PassId::random();
        self.store.seed_pass(BoardingPass {
            id: pass_id,
            user_id: rider_id,
            pass_type: PassType::LimitedRides,
            status: PassStatus::Active,
            valid_from: Some(fixture_now() - Duration::days(1)),
            valid_to: Some(fixture_now() + Duration::days(29)),
            total_trips: Some(total_trips),
            total_daily_trips: Some(total_daily_trips),
            plan: PassPlan {
                validity_days: Some(30),
            },
        });
        pass_id
    }

    /// Seed an active limited pass whose validity window is not yet set.
    pub fn seed_fresh_limited_pass(&self, rider_id: UserId, total_trips: u32) -> PassId {
        let pass_id = PassId::random();
        self.store.seed_pass(BoardingPass {
            id: pass_id,
            user_id: rider_id,
            pass_type: PassType::LimitedRides,
            status: PassStatus::Active,
            valid_from: None,
            valid_to: None,
            total_trips: Some(total_trips),
            total_daily_trips: Some(total_trips),
            plan: PassPlan {
                validity_days: Some(30),
            },
        });
        pass_id
    }

    pub fn create_request(
        &self,
        pass_id: PassId,
        candidates: Vec<VehicleId>,
    ) -> CreateRideRequest {
        CreateRideRequest {
            boarding_pass_id: pass_id,
            pickup: downtown_location("1 Vitosha Blvd"),
            dropoff: downtown_location("15 Alabin St"),
            candidate_vehicle_ids: candidates,
        }
    }
}
