//! Demo-environment seeding: three houses with distinct rooms, devices,
//! and alarm settings, enough to exercise every command from a client.

use domo_adapter_ws_axum::state::HubStateManager;
use domo_domain::alarm::AlarmCommand;
use domo_domain::device::{Color, DeviceAction, DeviceDraft};
use domo_domain::error::DomainError;
use domo_domain::id::{DeviceId, HouseId, RoomId};

/// Populate the manager with the demo houses.
///
/// # Errors
///
/// Propagates any [`DomainError`] from the underlying operations; with an
/// empty manager none are expected.
pub fn demo(manager: &HubStateManager) -> Result<(), DomainError> {
    suburban_home(manager)?;
    beach_house(manager)?;
    city_apartment(manager)?;
    tracing::info!("seeded demo houses");
    Ok(())
}

fn suburban_home(manager: &HubStateManager) -> Result<(), DomainError> {
    let house = manager.register_house("Suburban Home", 3);

    let (living, _) = manager.add_room(house, "Living Room")?;
    let lamp = add(manager, house, living, lamp_draft(70, Color::White))?;
    turn_on(manager, house, living, lamp)?;
    add(manager, house, living, lamp_draft(50, Color::Blue))?;
    add(manager, house, living, DeviceDraft::Blinds)?;

    let (kitchen, _) = manager.add_room(house, "Kitchen")?;
    let ceiling = add(manager, house, kitchen, ceiling_draft(100, Color::White))?;
    turn_on(manager, house, kitchen, ceiling)?;
    let lock = add(manager, house, kitchen, lock_draft("1234"))?;
    unlock(manager, house, kitchen, lock, "1234")?;

    let (bedroom, _) = manager.add_room(house, "Master Bedroom")?;
    add(manager, house, bedroom, lamp_draft(30, Color::Purple))?;
    add(manager, house, bedroom, ceiling_draft(100, Color::Yellow))?;
    let blinds = add(manager, house, bedroom, DeviceDraft::Blinds)?;
    apply(manager, house, bedroom, blinds, &DeviceAction::Lower)?;
    add(manager, house, bedroom, lock_draft("9876"))?;

    manager.set_alarm(house, AlarmCommand::Arm)?;
    Ok(())
}

fn beach_house(manager: &HubStateManager) -> Result<(), DomainError> {
    let house = manager.register_house("Beach House", 2);

    let (living, _) = manager.add_room(house, "Living Area")?;
    add(manager, house, living, ceiling_draft(90, Color::White))?;
    let lamp = add(manager, house, living, lamp_draft(60, Color::Yellow))?;
    turn_on(manager, house, living, lamp)?;

    let (kitchen, _) = manager.add_room(house, "Kitchen")?;
    add(manager, house, kitchen, ceiling_draft(100, Color::White))?;

    let (deck, _) = manager.add_room(house, "Deck")?;
    add(manager, house, deck, lamp_draft(100, Color::White))?;
    add(manager, house, deck, lamp_draft(100, Color::White))?;

    Ok(())
}

fn city_apartment(manager: &HubStateManager) -> Result<(), DomainError> {
    let house = manager.register_house("City Apartment", 3);

    let (living, _) = manager.add_room(house, "Living Room")?;
    let ceiling = add(manager, house, living, ceiling_draft(75, Color::White))?;
    turn_on(manager, house, living, ceiling)?;
    add(manager, house, living, lamp_draft(50, Color::Red))?;
    let blinds = add(manager, house, living, DeviceDraft::Blinds)?;
    apply(manager, house, living, blinds, &DeviceAction::Open)?;

    let (bedroom, _) = manager.add_room(house, "Bedroom")?;
    add(manager, house, bedroom, lamp_draft(30, Color::Blue))?;
    let lock = add(manager, house, bedroom, lock_draft("1111"))?;
    unlock(manager, house, bedroom, lock, "1111")?;

    Ok(())
}

fn lamp_draft(brightness: u8, color: Color) -> DeviceDraft {
    DeviceDraft::Lamp {
        brightness: Some(brightness),
        color: Some(color),
    }
}

fn ceiling_draft(brightness: u8, color: Color) -> DeviceDraft {
    DeviceDraft::CeilingLight {
        brightness: Some(brightness),
        color: Some(color),
    }
}

fn lock_draft(code: &str) -> DeviceDraft {
    DeviceDraft::Lock {
        code: code.to_string(),
    }
}

fn add(
    manager: &HubStateManager,
    house: HouseId,
    room: RoomId,
    draft: DeviceDraft,
) -> Result<DeviceId, DomainError> {
    let (device_id, _) = manager.add_device(house, room, draft)?;
    Ok(device_id)
}

fn turn_on(
    manager: &HubStateManager,
    house: HouseId,
    room: RoomId,
    device: DeviceId,
) -> Result<(), DomainError> {
    apply(manager, house, room, device, &DeviceAction::TurnOn)
}

fn unlock(
    manager: &HubStateManager,
    house: HouseId,
    room: RoomId,
    device: DeviceId,
    code: &str,
) -> Result<(), DomainError> {
    apply(
        manager,
        house,
        room,
        device,
        &DeviceAction::Unlock {
            code: code.to_string(),
        },
    )
}

fn apply(
    manager: &HubStateManager,
    house: HouseId,
    room: RoomId,
    device: DeviceId,
    action: &DeviceAction,
) -> Result<(), DomainError> {
    manager.apply_device_action(house, room, device, action)?;
    Ok(())
}
