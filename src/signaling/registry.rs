use std::collections::HashMap;

use super::types::{Connection, ConnectionId, Role, RoomName};

/// Role occupancy and membership for every room.
///
/// Rooms have no explicit lifecycle: a room exists only while some entry
/// below mentions it. The registry does no I/O and never notifies anyone;
/// callers broadcast whatever changes they make.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    hosts: HashMap<RoomName, Connection>,
    joiners: HashMap<RoomName, Connection>,
    rooms: HashMap<ConnectionId, (RoomName, Connection)>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, role: Role) -> &HashMap<RoomName, Connection> {
        match role {
            Role::Host => &self.hosts,
            Role::Joiner => &self.joiners,
        }
    }

    fn slots_mut(&mut self, role: Role) -> &mut HashMap<RoomName, Connection> {
        match role {
            Role::Host => &mut self.hosts,
            Role::Joiner => &mut self.joiners,
        }
    }

    /// Start watching `room` with `conn`
    pub fn track(&mut self, conn: Connection, room: RoomName) {
        self.rooms.insert(conn.id(), (room, conn));
    }

    /// Forget `id` entirely, returning the room it was watching
    pub fn untrack(&mut self, id: ConnectionId) -> Option<RoomName> {
        self.rooms.remove(&id).map(|(room, _)| room)
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<&RoomName> {
        self.rooms.get(&id).map(|(room, _)| room)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.rooms.get(&id).map(|(_, conn)| conn)
    }

    /// Give `role` in `room` to `conn`, displacing any previous holder.
    ///
    /// Any other role slot the connection held is released first so one
    /// connection never holds both roles of a room.
    pub fn assign(&mut self, room: &RoomName, conn: Connection, role: Role) {
        self.clear_if_holder(room, conn.id(), role.other());
        self.slots_mut(role).insert(room.clone(), conn);
    }

    pub fn set_host(&mut self, room: &RoomName, conn: Connection) {
        self.assign(room, conn, Role::Host);
    }

    pub fn set_joiner(&mut self, room: &RoomName, conn: Connection) {
        self.assign(room, conn, Role::Joiner);
    }

    /// Vacate `role` in `room`, but only if `id` is the current holder.
    ///
    /// Returns whether anything was removed.
    pub fn clear_if_holder(&mut self, room: &RoomName, id: ConnectionId, role: Role) -> bool {
        let slots = self.slots_mut(role);
        match slots.get(room) {
            Some(holder) if holder.id() == id => {
                slots.remove(room);
                true
            }
            _ => false,
        }
    }

    pub fn holder(&self, room: &RoomName, role: Role) -> Option<&Connection> {
        self.slots(role).get(room)
    }

    pub fn host_of(&self, room: &RoomName) -> Option<&Connection> {
        self.holder(room, Role::Host)
    }

    pub fn joiner_of(&self, room: &RoomName) -> Option<&Connection> {
        self.holder(room, Role::Joiner)
    }

    /// The role `id` currently holds in `room`, if any
    pub fn role_of(&self, room: &RoomName, id: ConnectionId) -> Option<Role> {
        [Role::Host, Role::Joiner]
            .into_iter()
            .find(|role| self.holder(room, *role).is_some_and(|c| c.id() == id))
    }

    pub fn can_host(&self, room: &RoomName) -> bool {
        !self.hosts.contains_key(room)
    }

    pub fn can_join(&self, room: &RoomName) -> bool {
        !self.joiners.contains_key(room)
    }

    /// Every tracked connection watching `room`, role holder or not, in id order
    pub fn members_of(&self, room: &RoomName) -> Vec<Connection> {
        let mut members: Vec<Connection> = self
            .rooms
            .values()
            .filter(|(r, _)| r == room)
            .map(|(_, conn)| conn.clone())
            .collect();
        members.sort_by_key(|c| c.id());
        members
    }

    pub fn connection_count(&self) -> usize {
        self.rooms.len()
    }
}
