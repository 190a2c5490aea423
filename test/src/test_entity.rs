use netvar_shared::{
    ActorId, FixedString128, FixedString32, Replicate, ReplicatedField, ReplicatedList,
    ReplicatedValue, Serde, SerdeErr, SerdeStream,
};

/// Actor id the harness uses for the authoritative side
pub const SERVER: ActorId = ActorId::new(0);
/// Actor id the harness uses for the observing side
pub const CLIENT: ActorId = ActorId::new(1);

#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Serde for Position {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        stream.serialize(&mut self.x)?;
        stream.serialize(&mut self.y)
    }
}

/// Sample replicated entity: one field of each shape the engine handles
pub struct TestEntity {
    pub health: ReplicatedValue<u32>,
    pub name: ReplicatedValue<FixedString32>,
    pub position: ReplicatedValue<Position>,
    pub inventory: ReplicatedList<u16>,
    pub waypoints: ReplicatedList<Position>,
    pub notes: ReplicatedList<FixedString128>,
    pub attached: bool,
}

impl TestEntity {
    pub const HEALTH: u16 = 0;
    pub const NAME: u16 = 1;
    pub const POSITION: u16 = 2;
    pub const INVENTORY: u16 = 3;
    pub const WAYPOINTS: u16 = 4;
    pub const NOTES: u16 = 5;

    pub fn new() -> Self {
        Self {
            health: ReplicatedValue::authority_only(100, SERVER),
            name: ReplicatedValue::authority_only(FixedString32::new(), SERVER),
            position: ReplicatedValue::authority_only(Position::default(), SERVER),
            inventory: ReplicatedList::authority_only(SERVER),
            waypoints: ReplicatedList::authority_only(SERVER),
            notes: ReplicatedList::authority_only(SERVER),
            attached: false,
        }
    }

    /// Same layout, but `owner` may also write the position and inventory
    pub fn owned_by(owner: ActorId) -> Self {
        Self {
            position: ReplicatedValue::owner_writable(Position::default(), SERVER, owner),
            inventory: ReplicatedList::owner_writable(SERVER, owner),
            ..Self::new()
        }
    }
}

impl Default for TestEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Replicate for TestEntity {
    fn fields(&self) -> Vec<&dyn ReplicatedField> {
        vec![
            &self.health,
            &self.name,
            &self.position,
            &self.inventory,
            &self.waypoints,
            &self.notes,
        ]
    }

    fn fields_mut(&mut self) -> Vec<&mut dyn ReplicatedField> {
        vec![
            &mut self.health,
            &mut self.name,
            &mut self.position,
            &mut self.inventory,
            &mut self.waypoints,
            &mut self.notes,
        ]
    }

    fn on_attach(&mut self) {
        self.attached = true;
    }

    fn on_detach(&mut self) {
        self.attached = false;
    }
}
