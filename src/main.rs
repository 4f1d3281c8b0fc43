fn main() -> anyhow::Result<()> {
    habit_coach_lib::run()
}
